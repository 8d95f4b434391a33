use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyBytes, PyIterator, PyLong};
use std::collections::BTreeSet;

use crate::cpu::Cpu;
use crate::memory::MemoryRegion;
use crate::register::Register;
use crate::runtime;
use crate::types::CpuId;

#[pyclass(name = "CPU", module = "pyqemu")]
#[derive(Debug)]
pub struct PyCpu {
    inner: Cpu,
}

#[pymethods]
impl PyCpu {
    #[new]
    #[pyo3(signature = (cpu_id=None))]
    fn new(cpu_id: Option<u32>) -> PyResult<Self> {
        let cpu = Cpu::new(runtime::backend()?, cpu_id.map(CpuId::new))?
            .with_register_case(runtime::config().plugin.register_case);
        Ok(Self { inner: cpu })
    }

    #[getter]
    fn cpu_id(&self) -> u32 {
        self.inner.id().index()
    }

    /// `cpu.rax` resolves the register `RAX` on this CPU.
    fn __getattr__(&self, name: &str) -> PyResult<PyRegister> {
        self.get_register(name)
    }

    #[pyo3(name = "getRegister")]
    fn get_register(&self, name: &str) -> PyResult<PyRegister> {
        Ok(PyRegister {
            inner: self.inner.register(name)?,
        })
    }

    #[pyo3(name = "setVirtualMemory")]
    fn set_virtual_memory(&self, address: u64, data: Vec<u8>) -> PyResult<()> {
        Ok(self.inner.set_virtual_memory(address, &data)?)
    }

    #[pyo3(name = "getVirtualMemory")]
    fn get_virtual_memory<'py>(
        &self,
        py: Python<'py>,
        address: u64,
        size: usize,
    ) -> PyResult<Bound<'py, PyByteArray>> {
        let data = self.inner.virtual_memory(address, size)?;
        Ok(PyByteArray::new_bound(py, &data))
    }

    #[pyo3(name = "getVirtualMemoryObj")]
    fn get_virtual_memory_obj(
        &self,
        py: Python<'_>,
        address: u64,
        size: usize,
    ) -> PyResult<Py<PyVirtualMemory>> {
        let region = self.inner.virtual_memory_region(address, size);
        Py::new(py, PyVirtualMemory::init(region))
    }

    #[staticmethod]
    #[pyo3(name = "setPhysicalMemory")]
    fn set_physical_memory(address: u64, data: Vec<u8>) -> PyResult<()> {
        Ok(Cpu::set_physical_memory(&runtime::backend()?, address, &data)?)
    }

    #[staticmethod]
    #[pyo3(name = "getPhysicalMemory")]
    fn get_physical_memory(
        py: Python<'_>,
        address: u64,
        size: usize,
    ) -> PyResult<Bound<'_, PyByteArray>> {
        let data = Cpu::physical_memory(&runtime::backend()?, address, size)?;
        Ok(PyByteArray::new_bound(py, &data))
    }

    #[staticmethod]
    #[pyo3(name = "getPhysicalMemoryObj")]
    fn get_physical_memory_obj(
        py: Python<'_>,
        address: u64,
        size: usize,
    ) -> PyResult<Py<PyPhysicalMemory>> {
        let region = Cpu::physical_memory_region(&runtime::backend()?, address, size);
        Py::new(py, PyPhysicalMemory::init(region))
    }

    #[staticmethod]
    #[pyo3(name = "getRegisterNames")]
    fn get_register_names() -> PyResult<BTreeSet<String>> {
        Ok(Cpu::backend_register_names(&runtime::backend()?)?)
    }
}

#[pyclass(name = "Register", module = "pyqemu")]
#[derive(Debug)]
pub struct PyRegister {
    inner: Register,
}

#[pymethods]
impl PyRegister {
    #[new]
    fn new(cpu_id: u32, name: String) -> PyResult<Self> {
        let inner = Register::new(runtime::backend()?, CpuId::new(cpu_id), name)?;
        Ok(Self { inner })
    }

    #[pyo3(name = "getName")]
    fn get_name(&self) -> String {
        self.inner.name().to_string()
    }

    #[getter]
    fn size(&self) -> usize {
        self.inner.size()
    }

    /// `reg(value)` stores `value mod 256**size` little-endian and returns
    /// the register for chaining. Any Python int is accepted, so registers
    /// wider than 128 bits are writable in full.
    fn __call__<'py>(
        slf: PyRef<'py, Self>,
        value: &Bound<'py, PyAny>,
    ) -> PyResult<PyRef<'py, Self>> {
        let encoded = to_le_bytes(value, slf.inner.size())?;
        slf.inner.set_bytes(&encoded)?;
        Ok(slf)
    }

    /// Raw bytes read as one big-endian Python int, at any width.
    fn __int__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let raw = self.inner.bytes()?;
        py.get_type_bound::<PyLong>()
            .call_method1("from_bytes", (PyBytes::new_bound(py, &raw), "big"))
    }

    fn __iter__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyIterator>> {
        let raw = self.inner.bytes()?;
        PyBytes::new_bound(py, &raw).as_any().iter()
    }

    fn __str__(&self) -> String {
        self.inner.name().to_string()
    }
}

/// `value mod 256**size` as `size` little-endian bytes, using Python int
/// arithmetic so negative and arbitrarily wide values behave like the
/// script-side `arg & 0xff` loop.
fn to_le_bytes(value: &Bound<'_, PyAny>, size: usize) -> PyResult<Vec<u8>> {
    let py = value.py();
    let mask = 1u8.into_py(py).into_bound(py).lshift(8 * size)?.sub(1u8)?;
    let masked = value.bitand(mask)?;
    let encoded = masked.call_method1("to_bytes", (size, "little"))?;
    Ok(encoded.downcast_into::<PyBytes>()?.as_bytes().to_vec())
}

/// Shared base of `VirtualMemory` and `PhysicalMemory`.
#[pyclass(subclass, name = "MemoryBase", module = "pyqemu")]
#[derive(Debug)]
pub struct PyMemoryBase {
    inner: MemoryRegion,
}

#[pymethods]
impl PyMemoryBase {
    #[pyo3(name = "getAddress")]
    fn get_address(&self) -> u64 {
        self.inner.address()
    }

    #[pyo3(name = "getSize")]
    fn get_size(&self) -> usize {
        self.inner.size()
    }

    fn __iter__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyIterator>> {
        let data = self.inner.read()?;
        PyBytes::new_bound(py, &data).as_any().iter()
    }

    /// `region(data)` writes `data` at the region start.
    fn __call__(&self, data: Vec<u8>) -> PyResult<()> {
        Ok(self.inner.write(&data)?)
    }

    fn __repr__(&self) -> String {
        format!(
            "<{} 0x{:x}+{}>",
            self.inner.space(),
            self.inner.address(),
            self.inner.size()
        )
    }
}

#[pyclass(extends = PyMemoryBase, name = "VirtualMemory", module = "pyqemu")]
#[derive(Debug)]
pub struct PyVirtualMemory;

impl PyVirtualMemory {
    fn init(region: MemoryRegion) -> PyClassInitializer<Self> {
        PyClassInitializer::from(PyMemoryBase { inner: region }).add_subclass(PyVirtualMemory)
    }
}

#[pymethods]
impl PyVirtualMemory {
    #[new]
    fn new(cpu: u32, address: u64, size: usize) -> PyResult<PyClassInitializer<Self>> {
        let region =
            MemoryRegion::virtual_memory(runtime::backend()?, CpuId::new(cpu), address, size);
        Ok(Self::init(region))
    }
}

#[pyclass(extends = PyMemoryBase, name = "PhysicalMemory", module = "pyqemu")]
#[derive(Debug)]
pub struct PyPhysicalMemory;

impl PyPhysicalMemory {
    fn init(region: MemoryRegion) -> PyClassInitializer<Self> {
        PyClassInitializer::from(PyMemoryBase { inner: region }).add_subclass(PyPhysicalMemory)
    }
}

#[pymethods]
impl PyPhysicalMemory {
    #[new]
    fn new(address: u64, size: usize) -> PyResult<PyClassInitializer<Self>> {
        let region = MemoryRegion::physical_memory(runtime::backend()?, address, size);
        Ok(Self::init(region))
    }
}
