//! Input validation utilities.

use crate::types::{Error, Result};

/// Validate that a string is not empty.
pub fn validate_non_empty(s: &str, field: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Validate that a write of `len` bytes fits a region of `size` bytes.
pub fn validate_fits(len: usize, size: usize) -> Result<()> {
    if len > size {
        return Err(Error::PayloadTooLarge { len, size });
    }
    Ok(())
}
