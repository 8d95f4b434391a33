//! # pyqemu-core - Analysis Plugin Binding for an Emulator
//!
//! Gives analysis scripts typed, synchronous access to a running emulator:
//! - CPU handles resolving registers by name
//! - Register read/write with width-checked byte encoding
//! - Virtual (per-CPU) and physical memory regions
//! - QObject tagged values for building job messages
//! - Job submission to named emulator queues
//!
//! ## Architecture
//!
//! Every handle holds a [`BackendHandle`] and forwards to it; nothing is
//! cached between calls.
//! ```text
//!                    ┌──────────────────────────────────┐
//!   scripts ──────▶  │   Cpu / Register / MemoryRegion  │
//!   (pyo3 module)    │   JobClient ◀── QObject (JSON)   │
//!                    └───────────────┬──────────────────┘
//!                                    │ dyn Backend
//!                    ┌───────────────▼──────────────────┐
//!                    │ emulator hooks  |  SimBackend    │
//!                    └──────────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod backend;
pub mod cpu;
pub mod jobs;
pub mod memory;
pub mod qobject;
pub mod register;
pub mod runtime;
pub mod types;
pub mod validation;

// Internal utilities
pub mod observability;

#[cfg(feature = "py-bindings")]
mod python;

pub use backend::{Backend, BackendHandle, RegisterValue, SimBackend};
pub use cpu::Cpu;
pub use jobs::JobClient;
pub use memory::{AddressSpace, MemoryRegion};
pub use qobject::{QDict, QList, QNum, QObject, QType};
pub use register::Register;
pub use types::{Config, CpuId, Error, QueueName, Result};
