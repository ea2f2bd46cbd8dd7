//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Installs the global JSON subscriber. `RUST_LOG` overrides the default
/// `info` filter.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}
