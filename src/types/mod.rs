//! Core types for the plugin binding.
//!
//! This module provides foundational types used throughout the crate:
//! - **IDs**: Strongly-typed identifiers (CpuId, QueueName)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for observability and accessors

mod config;
mod errors;
mod ids;

pub use config::{Config, JobEncoding, ObservabilityConfig, PluginConfig, RegisterCase};
pub use errors::{Error, Result};
pub use ids::{CpuId, QueueName};
