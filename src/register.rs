//! CPU register accessors.

use bytes::Bytes;
use std::fmt;

use crate::backend::BackendHandle;
use crate::types::{CpuId, Error, Result};
use crate::validation::validate_fits;

/// Handle on one named register of one CPU.
///
/// The width is fixed when the handle is created. Reads always go back to
/// the backend; the handle never holds a value.
#[derive(Clone)]
pub struct Register {
    backend: BackendHandle,
    cpu: CpuId,
    name: String,
    size: usize,
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("cpu", &self.cpu)
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}

impl Register {
    /// Look the register up on `cpu`. Fails with `UnknownRegister` if the
    /// backend does not know `name`.
    pub fn new(backend: BackendHandle, cpu: CpuId, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let size = backend.cpu_register(cpu, &name)?.size;
        Ok(Self {
            backend,
            cpu,
            name,
            size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cpu(&self) -> CpuId {
        self.cpu
    }

    /// Width in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Store `value` as exactly `size` little-endian bytes, dropping
    /// high-order bytes that do not fit. Returns `self` for chaining.
    pub fn set(&self, value: u128) -> Result<&Self> {
        self.set_bytes(&encode_le(value, self.size))
    }

    /// Store raw little-endian bytes. Shorter payloads are zero-extended to
    /// the register width; longer ones fail with `PayloadTooLarge`.
    ///
    /// This is the path for values wider than 128 bits.
    pub fn set_bytes(&self, bytes: &[u8]) -> Result<&Self> {
        validate_fits(bytes.len(), self.size)?;
        let mut encoded = bytes.to_vec();
        encoded.resize(self.size, 0);
        tracing::debug!("set {}:{} <- {:02x?}", self.cpu, self.name, encoded);
        self.backend
            .set_cpu_register(self.cpu, &self.name, &encoded)?;
        Ok(self)
    }

    /// Integer value of the register.
    ///
    /// The raw bytes are read as a **big-endian** number, while [`set`]
    /// writes little-endian, so `set(x)` followed by `get()` returns `x` with
    /// its bytes reversed. Scripts written against the emulator rely on this
    /// behaviour. Use [`bytes`] for the raw layout.
    ///
    /// [`set`]: Register::set
    /// [`bytes`]: Register::bytes
    pub fn get(&self) -> Result<u128> {
        let raw = self.bytes()?;
        decode_be(&raw).ok_or_else(|| Error::RegisterTooWide {
            name: self.name.clone(),
            size: raw.len(),
        })
    }

    /// Raw register bytes as returned by the backend.
    pub fn bytes(&self) -> Result<Bytes> {
        tracing::trace!("get {}:{}", self.cpu, self.name);
        Ok(self.backend.cpu_register(self.cpu, &self.name)?.bytes)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `value mod 256^size` as `size` little-endian bytes, zero padded past 16.
fn encode_le(value: u128, size: usize) -> Vec<u8> {
    let le = value.to_le_bytes();
    (0..size).map(|i| le.get(i).copied().unwrap_or(0)).collect()
}

/// Big-endian unsigned value of `raw`, or `None` if it needs more than 128 bits.
fn decode_be(raw: &[u8]) -> Option<u128> {
    let first = raw.iter().position(|&b| b != 0).unwrap_or(raw.len());
    let significant = &raw[first..];
    if significant.len() > 16 {
        return None;
    }
    Some(
        significant
            .iter()
            .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)),
    )
}
