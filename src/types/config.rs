//! Configuration structures.
//!
//! Configuration is loaded from a JSON file and overlaid with `PYQEMU_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::errors::{Error, Result};

/// Global plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Accessor and job submission behaviour.
    #[serde(default)]
    pub plugin: PluginConfig,
}

impl Config {
    /// Parse configuration from a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Default configuration overlaid with environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from `lookup` (an environment accessor) onto this config.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("PYQEMU_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("PYQEMU_LOG_FORMAT") {
            self.observability.json_logs = format.eq_ignore_ascii_case("json");
        }
        if let Some(case) = lookup("PYQEMU_REGISTER_CASE") {
            self.plugin.register_case = parse_env_enum("PYQEMU_REGISTER_CASE", &case)?;
        }
        if let Some(encoding) = lookup("PYQEMU_JOB_ENCODING") {
            self.plugin.job_encoding = parse_env_enum("PYQEMU_JOB_ENCODING", &encoding)?;
        }
        Ok(())
    }
}

fn parse_env_enum<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| Error::validation(format!("{}: unsupported value '{}'", key, raw)))
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// How register names are normalized before reaching the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegisterCase {
    /// `rax` and `Rax` both resolve to `RAX`.
    #[default]
    Upper,
    /// Names are passed through untouched.
    Preserve,
}

impl RegisterCase {
    pub fn normalize(self, name: &str) -> String {
        match self {
            RegisterCase::Upper => name.to_uppercase(),
            RegisterCase::Preserve => name.to_string(),
        }
    }
}

/// Wire encoding for submitted job messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobEncoding {
    /// Single-line JSON.
    #[default]
    Compact,
    /// Indented JSON, for queues that are read by humans.
    Pretty,
}

/// Accessor and job submission configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PluginConfig {
    #[serde(default)]
    pub register_case: RegisterCase,

    #[serde(default)]
    pub job_encoding: JobEncoding,
}
