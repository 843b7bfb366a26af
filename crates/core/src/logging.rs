//! Logging bootstrap
//!
//! The library itself only emits `tracing` events. Binaries and tests that
//! want to see them call [`init`] once at startup.

use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

/// Install a `fmt` subscriber filtered by the config's log directives
///
/// Invalid directives fall back to `info`. Returns `false` if a global
/// subscriber was already set, which makes repeated calls harmless.
pub fn init(config: &EngineConfig) -> bool {
    let filter = EnvFilter::try_new(config.effective_log_filter())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Logging initialized ({})", config.effective_log_filter());
    }
    installed
}
