//! In-process simulated emulator backend.
//!
//! Holds a register file per CPU, a sparse physical memory and a job log per
//! declared queue. Virtual addresses translate to physical ones by adding a
//! per-CPU base (identity by default).

use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{Backend, RegisterValue};
use crate::types::{CpuId, Error, Result};

const PAGE_SIZE: u64 = 0x1000;

/// Largest single read; bounds the snapshot buffer when memory is unbounded.
const MAX_READ: usize = 64 * 1024 * 1024;

/// General-purpose x86-64 registers, all 8 bytes wide.
const X86_64_REGISTERS: [&str; 18] = [
    "RAX", "RBX", "RCX", "RDX", "RSI", "RDI", "RBP", "RSP", "R8", "R9", "R10", "R11", "R12",
    "R13", "R14", "R15", "RIP", "RFLAGS",
];

#[derive(Debug, Default)]
struct SimState {
    cpu_count: u32,
    current: CpuId,
    widths: BTreeMap<String, usize>,
    registers: HashMap<(CpuId, String), Vec<u8>>,
    pages: HashMap<u64, Box<[u8]>>,
    memory_size: Option<u64>,
    virtual_bases: HashMap<CpuId, u64>,
    queues: HashMap<String, Vec<Bytes>>,
}

impl SimState {
    fn check_cpu(&self, cpu: CpuId) -> Result<()> {
        if cpu.index() >= self.cpu_count {
            return Err(Error::backend(format!("no such cpu: {}", cpu)));
        }
        Ok(())
    }

    fn width(&self, name: &str) -> Result<usize> {
        self.widths
            .get(name)
            .copied()
            .ok_or_else(|| Error::unknown_register(name))
    }

    fn check_range(&self, address: u64, len: usize) -> Result<()> {
        let end = address
            .checked_add(len as u64)
            .ok_or_else(|| Error::backend(format!("address range overflows: 0x{address:x}+{len}")))?;
        if let Some(size) = self.memory_size {
            if end > size {
                return Err(Error::backend(format!(
                    "physical access out of range: paddr=0x{address:x} len={len} size=0x{size:x}"
                )));
            }
        }
        Ok(())
    }

    fn translate(&self, cpu: CpuId, vaddr: u64) -> Result<u64> {
        self.check_cpu(cpu)?;
        let base = self.virtual_bases.get(&cpu).copied().unwrap_or(0);
        vaddr
            .checked_add(base)
            .ok_or_else(|| Error::backend(format!("no virtual translation for 0x{vaddr:x} on {cpu}")))
    }

    fn read(&self, address: u64, size: usize) -> Result<Bytes> {
        if size > MAX_READ {
            return Err(Error::backend(format!(
                "read of {size} bytes exceeds the {MAX_READ}-byte limit"
            )));
        }
        self.check_range(address, size)?;
        let mut out = vec![0u8; size];
        for (offset, byte) in out.iter_mut().enumerate() {
            let addr = address + offset as u64;
            if let Some(page) = self.pages.get(&(addr / PAGE_SIZE)) {
                *byte = page[(addr % PAGE_SIZE) as usize];
            }
        }
        Ok(Bytes::from(out))
    }

    fn write(&mut self, address: u64, data: &[u8]) -> Result<()> {
        self.check_range(address, data.len())?;
        for (offset, byte) in data.iter().enumerate() {
            let addr = address + offset as u64;
            let page = self
                .pages
                .entry(addr / PAGE_SIZE)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize].into_boxed_slice());
            page[(addr % PAGE_SIZE) as usize] = *byte;
        }
        Ok(())
    }
}

/// Simulated backend. Configure with the `with_*` builders, then share it as a
/// [`BackendHandle`](super::BackendHandle).
#[derive(Debug)]
pub struct SimBackend {
    state: Mutex<SimState>,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    /// One CPU, no registers, unbounded memory, no queues.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                cpu_count: 1,
                ..SimState::default()
            }),
        }
    }

    pub fn with_cpus(self, count: u32) -> Self {
        self.update(|s| s.cpu_count = count)
    }

    pub fn with_register(self, name: impl Into<String>, width: usize) -> Self {
        let name = name.into();
        self.update(|s| {
            s.widths.insert(name, width);
        })
    }

    pub fn with_x86_64_registers(self) -> Self {
        X86_64_REGISTERS
            .iter()
            .fold(self, |sim, name| sim.with_register(*name, 8))
    }

    /// Bound physical memory to `[0, size)`.
    pub fn with_memory_size(self, size: u64) -> Self {
        self.update(|s| s.memory_size = Some(size))
    }

    pub fn with_queue(self, queue: impl Into<String>) -> Self {
        let queue = queue.into();
        self.update(|s| {
            s.queues.entry(queue).or_default();
        })
    }

    fn update(mut self, f: impl FnOnce(&mut SimState)) -> Self {
        // Builders run before the backend is shared, so the lock cannot be contended.
        match self.state.get_mut() {
            Ok(state) => f(state),
            Err(poisoned) => f(poisoned.into_inner()),
        }
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, SimState>> {
        self.state
            .lock()
            .map_err(|_| Error::internal("simulated backend state poisoned"))
    }

    pub fn set_current_cpu(&self, cpu: CpuId) -> Result<()> {
        let mut state = self.state()?;
        state.check_cpu(cpu)?;
        state.current = cpu;
        Ok(())
    }

    /// Translate virtual addresses of `cpu` to `vaddr + base`.
    pub fn map_virtual(&self, cpu: CpuId, base: u64) -> Result<()> {
        let mut state = self.state()?;
        state.check_cpu(cpu)?;
        state.virtual_bases.insert(cpu, base);
        Ok(())
    }

    pub fn declare_queue(&self, queue: impl Into<String>) -> Result<()> {
        self.state()?.queues.entry(queue.into()).or_default();
        Ok(())
    }

    /// Payloads submitted to `queue`, oldest first.
    pub fn jobs(&self, queue: &str) -> Result<Vec<Bytes>> {
        self.state()?
            .queues
            .get(queue)
            .cloned()
            .ok_or_else(|| Error::backend(format!("queue not found: {}", queue)))
    }
}

impl Backend for SimBackend {
    fn current_cpu(&self) -> Result<CpuId> {
        Ok(self.state()?.current)
    }

    fn cpu_register(&self, cpu: CpuId, name: &str) -> Result<RegisterValue> {
        let state = self.state()?;
        state.check_cpu(cpu)?;
        let size = state.width(name)?;
        let bytes = state
            .registers
            .get(&(cpu, name.to_string()))
            .cloned()
            .unwrap_or_else(|| vec![0u8; size]);
        Ok(RegisterValue {
            bytes: Bytes::from(bytes),
            size,
        })
    }

    fn set_cpu_register(&self, cpu: CpuId, name: &str, bytes: &[u8]) -> Result<()> {
        let mut state = self.state()?;
        state.check_cpu(cpu)?;
        let size = state.width(name)?;
        let mut stored = bytes.to_vec();
        stored.resize(size, 0);
        state.registers.insert((cpu, name.to_string()), stored);
        Ok(())
    }

    fn register_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.state()?.widths.keys().cloned().collect())
    }

    fn virtual_memory(&self, cpu: CpuId, address: u64, size: usize) -> Result<Bytes> {
        let state = self.state()?;
        let paddr = state.translate(cpu, address)?;
        state.read(paddr, size)
    }

    fn set_virtual_memory(&self, cpu: CpuId, address: u64, data: &[u8]) -> Result<()> {
        let mut state = self.state()?;
        let paddr = state.translate(cpu, address)?;
        state.write(paddr, data)
    }

    fn physical_memory(&self, address: u64, size: usize) -> Result<Bytes> {
        self.state()?.read(address, size)
    }

    fn set_physical_memory(&self, address: u64, data: &[u8]) -> Result<()> {
        self.state()?.write(address, data)
    }

    fn add_job(&self, queue: &str, payload: &[u8]) -> Result<()> {
        let mut state = self.state()?;
        let jobs = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| Error::backend(format!("queue not found: {}", queue)))?;
        jobs.push(Bytes::copy_from_slice(payload));
        tracing::trace!("simulated queue {} now holds {} jobs", queue, jobs.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_memory_reads_zero() {
        let sim = SimBackend::new();
        assert_eq!(&sim.physical_memory(0x5000, 4).unwrap()[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_oversized_read_is_refused() {
        let sim = SimBackend::new();
        let err = sim.physical_memory(0, usize::MAX).unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert!(sim.virtual_memory(CpuId::new(0), 0, MAX_READ + 1).is_err());
    }

    #[test]
    fn test_write_spanning_pages() {
        let sim = SimBackend::new();
        sim.set_physical_memory(PAGE_SIZE - 2, &[1, 2, 3, 4]).unwrap();
        assert_eq!(
            &sim.physical_memory(PAGE_SIZE - 2, 4).unwrap()[..],
            &[1, 2, 3, 4]
        );
    }

    #[test]
    fn test_memory_size_bound() {
        let sim = SimBackend::new().with_memory_size(0x100);
        assert!(sim.set_physical_memory(0xfe, &[1, 2]).is_ok());
        let err = sim.set_physical_memory(0xff, &[1, 2]).unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert!(sim.physical_memory(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_virtual_translation_base() {
        let sim = SimBackend::new().with_cpus(2);
        sim.map_virtual(CpuId::new(1), 0x10_000).unwrap();

        sim.set_virtual_memory(CpuId::new(1), 0x20, &[0xaa]).unwrap();
        assert_eq!(&sim.physical_memory(0x10_020, 1).unwrap()[..], &[0xaa]);
        // cpu0 is identity-mapped and sees different bytes at the same vaddr
        assert_eq!(
            &sim.virtual_memory(CpuId::new(0), 0x20, 1).unwrap()[..],
            &[0x00]
        );
    }

    #[test]
    fn test_register_file() {
        let sim = SimBackend::new().with_x86_64_registers();
        let cpu = CpuId::new(0);

        let initial = sim.cpu_register(cpu, "RAX").unwrap();
        assert_eq!(initial.size, 8);
        assert_eq!(&initial.bytes[..], &[0u8; 8]);

        sim.set_cpu_register(cpu, "RAX", &[1, 2]).unwrap();
        assert_eq!(
            &sim.cpu_register(cpu, "RAX").unwrap().bytes[..],
            &[1, 2, 0, 0, 0, 0, 0, 0]
        );

        assert!(matches!(
            sim.cpu_register(cpu, "XMM0"),
            Err(Error::UnknownRegister(_))
        ));
        assert!(sim.register_names().unwrap().contains("RIP"));
    }

    #[test]
    fn test_unknown_cpu() {
        let sim = SimBackend::new().with_register("PC", 4);
        assert!(sim.cpu_register(CpuId::new(3), "PC").is_err());
        assert!(sim.set_current_cpu(CpuId::new(3)).is_err());
    }

    #[test]
    fn test_job_log() {
        let sim = SimBackend::new().with_queue("ra");
        sim.add_job("ra", b"{}").unwrap();
        assert_eq!(sim.jobs("ra").unwrap(), vec![Bytes::from_static(b"{}")]);
        assert!(sim.add_job("missing", b"{}").is_err());

        sim.declare_queue("late").unwrap();
        assert!(sim.add_job("late", b"[]").is_ok());
    }
}
