//! CPU context.
//!
//! A [`Cpu`] scopes register and virtual-memory access to one emulated CPU.
//! Physical memory and the register namespace are not tied to a CPU and are
//! exposed as associated functions taking the backend directly.

use bytes::Bytes;
use std::collections::BTreeSet;
use std::fmt;

use crate::backend::BackendHandle;
use crate::memory::MemoryRegion;
use crate::register::Register;
use crate::types::{CpuId, RegisterCase, Result};

#[derive(Clone)]
pub struct Cpu {
    backend: BackendHandle,
    id: CpuId,
    register_case: RegisterCase,
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("id", &self.id)
            .field("register_case", &self.register_case)
            .finish()
    }
}

impl Cpu {
    /// Context for `id`, or for the backend's current CPU when `None`.
    pub fn new(backend: BackendHandle, id: Option<CpuId>) -> Result<Self> {
        let id = match id {
            Some(id) => id,
            None => backend.current_cpu()?,
        };
        Ok(Self::with_id(backend, id))
    }

    pub fn current(backend: BackendHandle) -> Result<Self> {
        Self::new(backend, None)
    }

    pub fn with_id(backend: BackendHandle, id: CpuId) -> Self {
        Self {
            backend,
            id,
            register_case: RegisterCase::default(),
        }
    }

    /// Change how names passed to [`Cpu::register`] are normalized.
    pub fn with_register_case(mut self, register_case: RegisterCase) -> Self {
        self.register_case = register_case;
        self
    }

    pub fn id(&self) -> CpuId {
        self.id
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    // =========================================================================
    // Registers
    // =========================================================================

    /// Accessor for register `name` on this CPU. With the default
    /// [`RegisterCase::Upper`], `rax` resolves to `RAX`.
    pub fn register(&self, name: &str) -> Result<Register> {
        let name = self.register_case.normalize(name);
        Register::new(self.backend.clone(), self.id, name)
    }

    /// One accessor per register the backend knows about.
    pub fn registers(&self) -> Result<Vec<Register>> {
        self.backend
            .register_names()?
            .into_iter()
            .map(|name| Register::new(self.backend.clone(), self.id, name))
            .collect()
    }

    pub fn register_names(&self) -> Result<BTreeSet<String>> {
        Self::backend_register_names(&self.backend)
    }

    /// Register names for the emulated architecture.
    pub fn backend_register_names(backend: &BackendHandle) -> Result<BTreeSet<String>> {
        backend.register_names()
    }

    // =========================================================================
    // Virtual memory
    // =========================================================================

    /// Write `data` at `address`, through a region sized to the payload.
    pub fn set_virtual_memory(&self, address: u64, data: &[u8]) -> Result<()> {
        self.virtual_memory_region(address, data.len()).write(data)
    }

    pub fn virtual_memory(&self, address: u64, size: usize) -> Result<Bytes> {
        self.virtual_memory_region(address, size).read()
    }

    pub fn virtual_memory_region(&self, address: u64, size: usize) -> MemoryRegion {
        MemoryRegion::virtual_memory(self.backend.clone(), self.id, address, size)
    }

    // =========================================================================
    // Physical memory (CPU-independent)
    // =========================================================================

    pub fn set_physical_memory(backend: &BackendHandle, address: u64, data: &[u8]) -> Result<()> {
        Self::physical_memory_region(backend, address, data.len()).write(data)
    }

    pub fn physical_memory(backend: &BackendHandle, address: u64, size: usize) -> Result<Bytes> {
        Self::physical_memory_region(backend, address, size).read()
    }

    pub fn physical_memory_region(backend: &BackendHandle, address: u64, size: usize) -> MemoryRegion {
        MemoryRegion::physical_memory(backend.clone(), address, size)
    }
}
