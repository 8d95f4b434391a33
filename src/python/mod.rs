//! Python bindings (feature `py-bindings`).
//!
//! Builds the `pyqemu` extension module that analysis scripts import. The
//! module refuses to load unless the emulator has attached its backend via
//! [`runtime::install`](crate::runtime::install).

// pyo3's macro expansions contain unsafe blocks.
#![allow(unsafe_code)]

mod cpu;
mod qobject;

use pyo3::exceptions::{
    PyAttributeError, PyEnvironmentError, PyIndexError, PyKeyError, PyRuntimeError,
    PyValueError,
};
use pyo3::prelude::*;

use crate::qobject::QType;
use crate::runtime;
use crate::types::Error;

impl From<Error> for PyErr {
    fn from(err: Error) -> Self {
        let msg = err.to_string();
        match err {
            Error::UnknownRegister(_) => PyAttributeError::new_err(msg),
            Error::KeyNotFound(_) => PyKeyError::new_err(msg),
            Error::IndexOutOfRange { .. } => PyIndexError::new_err(msg),
            Error::PayloadTooLarge { .. } | Error::Validation(_) => PyValueError::new_err(msg),
            Error::BackendUnavailable => PyEnvironmentError::new_err(msg),
            _ => PyRuntimeError::new_err(msg),
        }
    }
}

#[pymodule]
#[pyo3(name = "pyqemu")]
fn pyqemu_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let config = runtime::config();
    crate::observability::init_tracing_with(&config.observability);

    // Fatal: nothing in this module works outside a live emulator.
    runtime::backend()?;

    m.add_class::<cpu::PyCpu>()?;
    m.add_class::<cpu::PyRegister>()?;
    m.add_class::<cpu::PyMemoryBase>()?;
    m.add_class::<cpu::PyVirtualMemory>()?;
    m.add_class::<cpu::PyPhysicalMemory>()?;
    m.add_class::<qobject::PyQObjectTypes>()?;
    m.add_class::<qobject::PyQNull>()?;
    m.add_class::<qobject::PyQNum>()?;
    m.add_class::<qobject::PyQString>()?;
    m.add_class::<qobject::PyQBool>()?;
    m.add_class::<qobject::PyQDict>()?;
    m.add_class::<qobject::PyQList>()?;
    m.add_class::<qobject::PyRapidAnalysis>()?;

    for qtype in QType::ALL {
        let name = format!("QTYPE_Q{}", qtype.name().to_uppercase());
        m.add(name.as_str(), qtype.as_u8())?;
    }

    tracing::debug!("pyqemu module initialized");
    Ok(())
}

#[cfg(all(test, feature = "py-tests"))]
mod tests {
    use super::*;
    use crate::backend::SimBackend;
    use crate::qobject::QObject;
    use pyo3::types::PyDict;
    use std::sync::Arc;

    /// Run `code` with the module bound to `pyqemu`; Python asserts fail the test.
    fn run(code: &str) -> Arc<SimBackend> {
        let sim = runtime::shared_test_backend();
        Python::with_gil(|py| {
            let module = pyo3::wrap_pymodule!(super::pyqemu_module)(py);
            let globals = PyDict::new_bound(py);
            globals.set_item("pyqemu", module).unwrap();
            if let Err(err) = py.run_bound(code, Some(&globals), None) {
                err.print(py);
                panic!("python snippet failed: {err}");
            }
        });
        sim
    }

    #[test]
    fn test_dict_scenario() {
        run(r#"
d = pyqemu.QDict()
d.qdict_put_int("count", 5)
d.qdict_put_str("name", "tracer")
assert len(d) == 2
assert int(d["count"].value) == 5
assert str(d["name"]) == "tracer"
assert d["count"].o_type == pyqemu.QObjectTypes.QTYPE_QNUM
assert d.o_type == int(pyqemu.QObjectTypes.QTYPE_QDICT) == 4
assert list(d) == ["count", "name"]
assert str(d) == "{'count': 5, 'name': tracer}"
try:
    d["missing"]
except KeyError:
    pass
else:
    raise AssertionError("missing key must raise KeyError")
"#);
    }

    #[test]
    fn test_list_scenario_and_indexing() {
        run(r#"
l = pyqemu.QList()
l.qlist_append_bool(True)
l.qlist_append_null()
assert len(l) == 2
assert bool(l[0]) is True
assert bool(l[1]) is False
assert l[-1].value is None
assert l[-2].value is True
for bad in (2, -3):
    try:
        l[bad]
    except IndexError:
        pass
    else:
        raise AssertionError(bad)
l[-1] = "x"
assert str(l) == "[True, x]"
"#);
    }

    #[test]
    fn test_scalar_classes() {
        run(r#"
n = pyqemu.QNum(5)
assert n.o_type == 2 and int(n) == 5 and str(n) == "5" and bool(n)
assert not pyqemu.QNum(0)
assert str(pyqemu.QNum(1.5)) == "1.5"
assert pyqemu.QNum(2**64 - 1).value == 2**64 - 1
assert not pyqemu.QString("")
assert pyqemu.QString("abc").value == "abc"
assert pyqemu.QBool(True).value is True and str(pyqemu.QBool(False)) == "False"
assert pyqemu.QNull().value is None and str(pyqemu.QNull()) == "None"
assert not pyqemu.QNull()
try:
    pyqemu.QNum("5")
except TypeError:
    pass
else:
    raise AssertionError("QNum accepts only numbers")
"#);
    }

    #[test]
    fn test_nested_edits_reach_submitted_message() {
        let sim = runtime::shared_test_backend();
        sim.declare_queue("py.nested").unwrap();
        run(r#"
d = pyqemu.QDict()
d.qdict_put("inner", pyqemu.QList())
d["inner"].qlist_append_int(1)
assert len(d["inner"]) == 1
l = pyqemu.QList()
d.qdict_put("l", l)
l.qlist_append_int(2)
assert len(d["l"]) == 1
d.qdict_put("plain", {"k": [None, 3]})
d["plain"]["k"].qlist_append_str("s")
pyqemu.RapidAnalysis.addJob("py.nested", d)
"#);

        let jobs = sim.jobs("py.nested").unwrap();
        assert_eq!(jobs.len(), 1);
        let expected =
            QObject::from_json_str(r#"{"inner":[1],"l":[2],"plain":{"k":[null,3,"s"]}}"#).unwrap();
        assert_eq!(QObject::from_json_slice(&jobs[0]).unwrap(), expected);
    }

    #[test]
    fn test_self_reference_is_rejected() {
        run(r#"
d = pyqemu.QDict()
d.qdict_put("me", d)
try:
    str(d)
except ValueError:
    pass
else:
    raise AssertionError("cyclic message must not render")
"#);
    }

    #[test]
    fn test_raw_payloads_are_forwarded_unchanged() {
        let sim = runtime::shared_test_backend();
        sim.declare_queue("py.raw").unwrap();
        run(r#"
pyqemu.RapidAnalysis.addJob("py.raw", b"\x01raw")
pyqemu.RapidAnalysis.addJob("py.raw", bytearray(b"\x02"))
try:
    pyqemu.RapidAnalysis.addJob("py.undeclared", b"x")
except RuntimeError:
    pass
else:
    raise AssertionError("unknown queue must fail")
"#);

        let jobs = sim.jobs("py.raw").unwrap();
        assert_eq!(&jobs[0][..], b"\x01raw");
        assert_eq!(&jobs[1][..], b"\x02");
    }

    #[test]
    fn test_cpu_registers() {
        run(r#"
cpu = pyqemu.CPU(1)
assert cpu.cpu_id == 1
r = cpu.rcx
assert r.getName() == "RCX" and str(r) == "RCX" and r.size == 8
assert r(0x1122334455667788)(0x0102) is r
assert list(r) == [2, 1, 0, 0, 0, 0, 0, 0]
assert int(r) == 0x0201000000000000
r(-1)
assert list(r) == [0xff] * 8
assert "RIP" in pyqemu.CPU.getRegisterNames()
try:
    cpu.nosuch
except AttributeError:
    pass
else:
    raise AssertionError("unknown register must raise AttributeError")
"#);
    }

    #[test]
    fn test_wide_register_uses_python_ints() {
        run(r#"
y = pyqemu.CPU(1).getRegister("ymm0")
y(1 << 200)
raw = list(y)
assert len(raw) == 32 and raw[25] == 1 and sum(raw) == 1
assert int(y) == 1 << 48
y((1 << 256) + 7)
assert list(y)[0] == 7 and sum(list(y)) == 7
"#);
    }

    #[test]
    fn test_memory_objects() {
        run(r#"
m = pyqemu.VirtualMemory(0, 0x7000, 4)
assert isinstance(m, pyqemu.MemoryBase)
assert m.getAddress() == 0x7000 and m.getSize() == 4
m(b"\x01\x02")
assert bytes(m) == b"\x01\x02\x00\x00"
try:
    m(b"\x01\x02\x03\x04\x05")
except ValueError:
    pass
else:
    raise AssertionError("oversize write must raise ValueError")
assert bytes(m) == b"\x01\x02\x00\x00"

cpu = pyqemu.CPU(0)
cpu.setVirtualMemory(0x7100, b"xy")
assert cpu.getVirtualMemory(0x7100, 2) == bytearray(b"xy")
assert bytes(cpu.getVirtualMemoryObj(0x7100, 2)) == b"xy"

pyqemu.CPU.setPhysicalMemory(0x7200, b"ab")
assert pyqemu.CPU.getPhysicalMemory(0x7200, 2) == bytearray(b"ab")
p = pyqemu.CPU.getPhysicalMemoryObj(0x7200, 2)
assert isinstance(p, pyqemu.PhysicalMemory) and bytes(p) == b"ab"
"#);
    }

    #[test]
    fn test_error_mapping() {
        Python::with_gil(|py| {
            let cases = [
                (Error::BackendUnavailable, "OSError"),
                (Error::unknown_register("X"), "AttributeError"),
                (Error::key_not_found("k"), "KeyError"),
                (Error::IndexOutOfRange { index: 1, len: 0 }, "IndexError"),
                (Error::PayloadTooLarge { len: 5, size: 4 }, "ValueError"),
                (Error::validation("empty"), "ValueError"),
                (Error::backend("busy"), "RuntimeError"),
            ];
            for (err, expected) in cases {
                let py_err = PyErr::from(err);
                let name = py_err.get_type_bound(py).name().unwrap().to_string();
                assert_eq!(name, expected);
            }
        });
    }
}
