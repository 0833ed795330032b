//! Logging setup for the host binary.

use env_logger::{Builder, Env};

/// Default filter when `RUST_LOG` isn't set.
pub const DEFAULT_FILTER: &str = "info";

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.format_target(false);
    builder
}

/// Installs the global logger. Levels come from `RUST_LOG`, defaulting to
/// [`DEFAULT_FILTER`].
pub fn init() {
    builder().init();
}
