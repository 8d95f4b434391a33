//! Emulator backend capability.
//!
//! Every accessor in this crate talks to the emulator through [`Backend`], one
//! method per foreign call. Calls are synchronous and block until the backend
//! answers; nothing is cached on this side.
//!
//! Hosts hand accessors a shared [`BackendHandle`]. [`SimBackend`] is an
//! in-process implementation for tests and offline script development.

mod sim;

pub use sim::SimBackend;

use bytes::Bytes;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::types::{CpuId, Result};

/// Raw register contents as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValue {
    pub bytes: Bytes,
    /// Register width in bytes.
    pub size: usize,
}

/// Foreign call surface of the emulator.
///
/// Implementations report unknown register names as
/// [`Error::UnknownRegister`](crate::Error::UnknownRegister) and any other
/// failure as [`Error::Backend`](crate::Error::Backend).
#[cfg_attr(test, mockall::automock)]
pub trait Backend: Send + Sync {
    /// CPU the emulator is currently executing on.
    fn current_cpu(&self) -> Result<CpuId>;

    fn cpu_register(&self, cpu: CpuId, name: &str) -> Result<RegisterValue>;

    fn set_cpu_register(&self, cpu: CpuId, name: &str, bytes: &[u8]) -> Result<()>;

    /// Register names known for the emulated architecture.
    fn register_names(&self) -> Result<BTreeSet<String>>;

    /// Read `size` bytes at a guest virtual address, translated through `cpu`.
    fn virtual_memory(&self, cpu: CpuId, address: u64, size: usize) -> Result<Bytes>;

    fn set_virtual_memory(&self, cpu: CpuId, address: u64, data: &[u8]) -> Result<()>;

    fn physical_memory(&self, address: u64, size: usize) -> Result<Bytes>;

    fn set_physical_memory(&self, address: u64, data: &[u8]) -> Result<()>;

    /// Hand an encoded job message to the named queue.
    fn add_job(&self, queue: &str, payload: &[u8]) -> Result<()>;
}

/// Shared handle passed to every accessor.
pub type BackendHandle = Arc<dyn Backend>;
