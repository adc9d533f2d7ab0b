//! Tracing bootstrap.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's job. This helper wires the conventional setup for binaries and
//! integration tests.

use tracing_subscriber::EnvFilter;

/// Installs a compact stdout subscriber honoring `RUST_LOG`, falling back to
/// `default_filter`. Calling it twice is harmless; later calls are no-ops.
pub fn init(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();
}
