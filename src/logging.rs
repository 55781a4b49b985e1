//! Tracing setup for binaries and tests embedding this client.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing with an env-filtered compact formatter.
///
/// Safe to call more than once; later calls are no-ops if a global
/// subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
