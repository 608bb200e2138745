//! Tracing/logging setup shared by every binary and test harness.

pub mod logging;

pub use logging::{LogFormat, ParseLogFormatError};

/// Initialize process-wide logging from the environment.
///
/// - `RUST_LOG` filters (default `info`)
/// - `FORGEOPS_LOG_FORMAT` selects `json` (default) or `pretty`
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    logging::init_from_env();
}
