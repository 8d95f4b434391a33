//! QObject discriminant tags.
//!
//! Numeric values match the tags the emulator uses on its side of the job
//! queue, so they can be exchanged as plain integers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Error, Result};

/// Variant tag shared by every QObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum QType {
    Null = 1,
    Num = 2,
    String = 3,
    Dict = 4,
    List = 5,
    Bool = 6,
}

impl QType {
    pub const ALL: [QType; 6] = [
        QType::Null,
        QType::Num,
        QType::String,
        QType::Dict,
        QType::List,
        QType::Bool,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            QType::Null => "null",
            QType::Num => "num",
            QType::String => "string",
            QType::Dict => "dict",
            QType::List => "list",
            QType::Bool => "bool",
        }
    }
}

impl TryFrom<u8> for QType {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        QType::ALL
            .into_iter()
            .find(|t| t.as_u8() == tag)
            .ok_or_else(|| Error::validation(format!("unknown qtype tag {}", tag)))
    }
}

impl fmt::Display for QType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
