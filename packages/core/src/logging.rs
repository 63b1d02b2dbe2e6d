//! Tracing Setup
//!
//! Hosts call [`init_tracing`] once at startup. The library itself only emits
//! through `tracing` macros; remote-message divergence is logged under the
//! `mediatree_core::sync` target.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info"` or `"mediatree_core::sync=debug"`).
///
/// Returns `false` when a global subscriber was already installed, which makes
/// repeated calls from tests harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
