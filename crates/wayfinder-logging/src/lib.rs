//! Tracing setup shared by wayfinder binaries and tests.
//!
//! The filter comes from `RUST_LOG`; without it every `wayfinder_*` crate
//! logs at `info`.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "wayfinder=info";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

/// Install the global subscriber. Panics if one is already installed.
pub fn init() {
    tracing_subscriber::registry()
        .with(filter(DEFAULT_FILTER))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the global subscriber unless one is already set.
///
/// Output goes to stdout, for binaries that may be started more than once
/// inside a host process.
pub fn try_init() -> Result<(), TryInitError> {
    try_init_with(DEFAULT_FILTER)
}

/// Like [`try_init`] with caller-chosen fallback directives.
pub fn try_init_with(default_directives: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(filter(default_directives))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Install a subscriber whose output the test harness captures per test.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_for_tests() {
    let _ = tracing_subscriber::registry()
        .with(filter(DEFAULT_FILTER))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_reported_not_fatal() {
        init_for_tests();
        init_for_tests();
        assert!(try_init().is_err());
        assert!(try_init_with("wayfinder=debug").is_err());
        tracing::info!(target: "wayfinder_logging", "still logging");
    }
}
