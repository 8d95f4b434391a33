//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the plugin binding.
#[derive(Error, Debug)]
pub enum Error {
    /// The backend does not recognize a register name.
    #[error("unknown register: {0}")]
    UnknownRegister(String),

    /// A write carried more bytes than the target region holds.
    #[error("payload too large: {len} bytes into a {size}-byte region")]
    PayloadTooLarge { len: usize, size: usize },

    /// QDict lookup of a missing key.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// QList access past the end.
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// No emulator backend is attached to this process.
    #[error("backend unavailable: plugins must be run from within an emulator instance")]
    BackendUnavailable,

    /// Register value does not fit the integer coercion target.
    #[error("register {name} is {size} bytes wide and does not fit in 128 bits")]
    RegisterTooWide { name: String, size: usize },

    /// Failure reported by the backend (queue not found, busy, bad address).
    #[error("backend error: {0}")]
    Backend(String),

    /// Validation errors.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience constructors
impl Error {
    pub fn unknown_register(name: impl Into<String>) -> Self {
        Self::UnknownRegister(name.into())
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound(key.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
