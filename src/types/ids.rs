//! Strongly-typed identifiers.
//!
//! All IDs are validated at construction time and implement common traits.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{Error, Result};
use crate::validation::validate_non_empty;

/// Emulator CPU index as reported by the backend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CpuId(u32);

impl CpuId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

impl From<u32> for CpuId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu{}", self.0)
    }
}

/// Macro to define a strongly-typed, non-empty string name.
///
/// Generates: struct, `from_string()`, `as_str()`, Display, Serialize, Deserialize.
macro_rules! define_name {
    ($name:ident, $field:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: impl Into<String>) -> Result<Self> {
                let s = s.into();
                validate_non_empty(&s, $field)?;
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(s: &str) -> Result<Self> {
                Self::from_string(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_name!(QueueName, "queue name");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name_rejects_empty() {
        let err = QueueName::from_string("").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("queue name cannot be empty"));
    }

    #[test]
    fn test_queue_name_round_trip() {
        let queue = QueueName::try_from("ra.jobs").unwrap();
        assert_eq!(queue.as_str(), "ra.jobs");
        assert_eq!(queue.to_string(), "ra.jobs");
    }

    #[test]
    fn test_cpu_id_display() {
        assert_eq!(CpuId::new(2).to_string(), "cpu2");
        assert_eq!(CpuId::from(7).index(), 7);
    }
}
