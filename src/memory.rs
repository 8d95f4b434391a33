//! Guest memory regions.
//!
//! A [`MemoryRegion`] is a capability over `[address, address + size)` in one
//! address space. It holds no data: `read` snapshots the backend at call time
//! and `write` forwards straight to it.

use bytes::Bytes;
use std::fmt;

use crate::backend::BackendHandle;
use crate::types::{CpuId, Result};
use crate::validation::validate_fits;

/// Address space a region lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    /// Guest virtual addresses, translated by the backend through this CPU.
    Virtual(CpuId),
    /// Guest physical addresses, shared by all CPUs.
    Physical,
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpace::Virtual(cpu) => write!(f, "virtual({})", cpu),
            AddressSpace::Physical => f.write_str("physical"),
        }
    }
}

/// Bounded view of guest memory.
#[derive(Clone)]
pub struct MemoryRegion {
    backend: BackendHandle,
    space: AddressSpace,
    address: u64,
    size: usize,
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("space", &self.space)
            .field("address", &format_args!("0x{:x}", self.address))
            .field("size", &self.size)
            .finish()
    }
}

impl MemoryRegion {
    pub fn new(backend: BackendHandle, space: AddressSpace, address: u64, size: usize) -> Self {
        Self {
            backend,
            space,
            address,
            size,
        }
    }

    pub fn virtual_memory(backend: BackendHandle, cpu: CpuId, address: u64, size: usize) -> Self {
        Self::new(backend, AddressSpace::Virtual(cpu), address, size)
    }

    pub fn physical_memory(backend: BackendHandle, address: u64, size: usize) -> Self {
        Self::new(backend, AddressSpace::Physical, address, size)
    }

    pub fn space(&self) -> AddressSpace {
        self.space
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Snapshot the region's current contents.
    pub fn read(&self) -> Result<Bytes> {
        tracing::trace!("read {} 0x{:x}+{}", self.space, self.address, self.size);
        match self.space {
            AddressSpace::Virtual(cpu) => self.backend.virtual_memory(cpu, self.address, self.size),
            AddressSpace::Physical => self.backend.physical_memory(self.address, self.size),
        }
    }

    /// Forward `data` to the start of the region.
    ///
    /// Payloads longer than the region are rejected before anything reaches
    /// the backend. Shorter payloads are forwarded as-is; what a short write
    /// means is up to the backend.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        if let Err(err) = validate_fits(data.len(), self.size) {
            tracing::warn!(
                "rejected {}-byte write to {} 0x{:x}+{}",
                data.len(),
                self.space,
                self.address,
                self.size
            );
            return Err(err);
        }

        tracing::debug!("write {} 0x{:x} len={}", self.space, self.address, data.len());
        match self.space {
            AddressSpace::Virtual(cpu) => self.backend.set_virtual_memory(cpu, self.address, data),
            AddressSpace::Physical => self.backend.set_physical_memory(self.address, data),
        }
    }
}
