//! QObject tagged-value model.
//!
//! Scripts build job messages out of QObjects: a closed set of variants
//! (null, number, string, dict, list, bool) that the emulator decodes on the
//! other side of the job queue.
//!
//! ```text
//!   QDict ──put_int/put_str/..──▶ QObject::{Num, String, ..}
//!   QList ──append_*───────────▶ QObject::{Num, String, ..}
//!     │
//!     └── to_json_bytes() ──▶ JobClient::add_job(queue, bytes)
//! ```
//!
//! Rendering through `Display` is meant for diagnostics and follows the
//! script-side `str()`: dict keys are quoted, string values are not
//! (`{'name': tracer}`). The wire form is the JSON encoding produced by
//! [`QObject::to_json_bytes`].

mod dict;
mod json;
mod list;
mod types;

pub use dict::QDict;
pub use list::QList;
pub use types::QType;

use std::fmt;

// =============================================================================
// Numbers
// =============================================================================

/// Numeric payload of a `QObject::Num`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QNum {
    I64(i64),
    U64(u64),
    Double(f64),
}

impl QNum {
    /// Integer view. Doubles truncate toward zero; out-of-range values yield `None`.
    pub fn to_i64(self) -> Option<i64> {
        match self {
            QNum::I64(v) => Some(v),
            QNum::U64(v) => i64::try_from(v).ok(),
            QNum::Double(d) => {
                let t = d.trunc();
                (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
            }
        }
    }

    /// Unsigned view. Negative values yield `None`.
    pub fn to_u64(self) -> Option<u64> {
        match self {
            QNum::I64(v) => u64::try_from(v).ok(),
            QNum::U64(v) => Some(v),
            QNum::Double(d) => {
                let t = d.trunc();
                (t.is_finite() && t >= 0.0 && t < u64::MAX as f64).then_some(t as u64)
            }
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            QNum::I64(v) => v as f64,
            QNum::U64(v) => v as f64,
            QNum::Double(d) => d,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            QNum::I64(v) => v == 0,
            QNum::U64(v) => v == 0,
            QNum::Double(d) => d == 0.0,
        }
    }
}

impl fmt::Display for QNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QNum::I64(v) => write!(f, "{}", v),
            QNum::U64(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on whole doubles
            QNum::Double(d) => write!(f, "{:?}", d),
        }
    }
}

// =============================================================================
// QObject
// =============================================================================

/// A tagged value.
///
/// The variant is the discriminant, so it is fixed for the lifetime of the
/// value. Only the contents of `Dict` and `List` can change.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QObject {
    #[default]
    Null,
    Num(QNum),
    String(String),
    Dict(QDict),
    List(QList),
    Bool(bool),
}

impl QObject {
    pub fn qtype(&self) -> QType {
        match self {
            QObject::Null => QType::Null,
            QObject::Num(_) => QType::Num,
            QObject::String(_) => QType::String,
            QObject::Dict(_) => QType::Dict,
            QObject::List(_) => QType::List,
            QObject::Bool(_) => QType::Bool,
        }
    }

    /// Boolean coercion: null is false, numbers are true when nonzero,
    /// strings and containers are true when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            QObject::Null => false,
            QObject::Num(n) => !n.is_zero(),
            QObject::String(s) => !s.is_empty(),
            QObject::Dict(d) => !d.is_empty(),
            QObject::List(l) => !l.is_empty(),
            QObject::Bool(b) => *b,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, QObject::Null)
    }

    pub fn as_num(&self) -> Option<QNum> {
        match self {
            QObject::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            QObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            QObject::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&QDict> {
        match self {
            QObject::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut QDict> {
        match self {
            QObject::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&QList> {
        match self {
            QObject::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut QList> {
        match self {
            QObject::List(l) => Some(l),
            _ => None,
        }
    }
}

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}

impl fmt::Display for QObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QObject::Null => f.write_str("None"),
            QObject::Num(n) => fmt::Display::fmt(n, f),
            QObject::String(s) => f.write_str(s),
            QObject::Dict(d) => fmt::Display::fmt(d, f),
            QObject::List(l) => fmt::Display::fmt(l, f),
            QObject::Bool(true) => f.write_str("True"),
            QObject::Bool(false) => f.write_str("False"),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<()> for QObject {
    fn from(_: ()) -> Self {
        QObject::Null
    }
}

impl From<QNum> for QObject {
    fn from(n: QNum) -> Self {
        QObject::Num(n)
    }
}

impl From<i64> for QObject {
    fn from(v: i64) -> Self {
        QObject::Num(QNum::I64(v))
    }
}

impl From<i32> for QObject {
    fn from(v: i32) -> Self {
        QObject::Num(QNum::I64(v.into()))
    }
}

impl From<u64> for QObject {
    fn from(v: u64) -> Self {
        QObject::Num(QNum::U64(v))
    }
}

impl From<u32> for QObject {
    fn from(v: u32) -> Self {
        QObject::Num(QNum::U64(v.into()))
    }
}

impl From<f64> for QObject {
    fn from(v: f64) -> Self {
        QObject::Num(QNum::Double(v))
    }
}

impl From<bool> for QObject {
    fn from(v: bool) -> Self {
        QObject::Bool(v)
    }
}

impl From<&str> for QObject {
    fn from(v: &str) -> Self {
        QObject::String(v.to_string())
    }
}

impl From<String> for QObject {
    fn from(v: String) -> Self {
        QObject::String(v)
    }
}

impl From<QDict> for QObject {
    fn from(v: QDict) -> Self {
        QObject::Dict(v)
    }
}

impl From<QList> for QObject {
    fn from(v: QList) -> Self {
        QObject::List(v)
    }
}

impl<T: Into<QObject>> From<Option<T>> for QObject {
    fn from(v: Option<T>) -> Self {
        v.map_or(QObject::Null, Into::into)
    }
}
