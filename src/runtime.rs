//! Process-wide backend attachment.
//!
//! The emulator installs its backend once at startup, before any plugin
//! module is loaded. Plugin entry points that cannot receive a backend
//! argument (the Python module) resolve it here and fail with
//! `BackendUnavailable` when the process is not running inside an emulator.
//! Rust callers should pass a [`BackendHandle`] to constructors directly.

use std::sync::OnceLock;

use crate::backend::BackendHandle;
use crate::types::{Config, Error, Result};

static BACKEND: OnceLock<BackendHandle> = OnceLock::new();
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Attach the emulator backend. Only the first call succeeds.
pub fn install(backend: BackendHandle) -> Result<()> {
    BACKEND
        .set(backend)
        .map_err(|_| Error::internal("emulator backend already installed"))?;
    tracing::info!("emulator backend attached");
    Ok(())
}

/// Attach the backend together with plugin configuration.
pub fn install_with_config(backend: BackendHandle, config: Config) -> Result<()> {
    install(backend)?;
    // reached at most once: `install` above already rejected any second call
    let _ = CONFIG.set(config);
    Ok(())
}

pub fn is_installed() -> bool {
    BACKEND.get().is_some()
}

/// The installed backend, or `BackendUnavailable`.
pub fn backend() -> Result<BackendHandle> {
    BACKEND.get().cloned().ok_or(Error::BackendUnavailable)
}

/// Configuration supplied at install time, or the defaults.
pub fn config() -> Config {
    CONFIG.get().cloned().unwrap_or_default()
}

/// The process-wide backend every test in this binary shares.
#[cfg(test)]
pub(crate) fn shared_test_backend() -> std::sync::Arc<crate::backend::SimBackend> {
    use crate::backend::SimBackend;
    use std::sync::Arc;

    static SIM: OnceLock<Arc<SimBackend>> = OnceLock::new();
    SIM.get_or_init(|| {
        let sim = Arc::new(
            SimBackend::new()
                .with_cpus(2)
                .with_x86_64_registers()
                .with_register("YMM0", 32),
        );
        let _ = install(sim.clone());
        sim
    })
    .clone()
}
