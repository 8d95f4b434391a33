//! QObject job-message encoding benchmark.
//!
//! Measures JSON encode/decode of flat and nested messages using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pyqemu_core::{QDict, QList, QObject};

fn message(width: usize) -> QObject {
    let mut regs = QList::new();
    for i in 0..width {
        regs.append_uint(0x1000 + i as u64);
    }
    let mut d = QDict::new();
    for i in 0..width {
        d.put_int(format!("field{}", i), i as i64);
    }
    d.put_str("module", "kernel32.dll");
    d.put("regs", regs);
    QObject::Dict(d)
}

fn bench_encode(c: &mut Criterion) {
    let widths: &[usize] = &[1, 16, 256, 4096];

    let mut group = c.benchmark_group("to_json_bytes");
    for &width in widths {
        let msg = message(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &msg, |b, m| {
            b.iter(|| black_box(m).to_json_bytes().unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let widths: &[usize] = &[1, 16, 256, 4096];

    let mut group = c.benchmark_group("from_json_slice");
    for &width in widths {
        let wire = message(width).to_json_bytes().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(width), &wire, |b, w| {
            b.iter(|| QObject::from_json_slice(black_box(w)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
