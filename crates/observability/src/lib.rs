//! Process-wide logging setup shared by the Souk binaries and tests.

pub mod logging;

pub use logging::{LogFormat, LogSettings};

/// Initialize logging from the environment (`RUST_LOG`, `SOUK_LOG_FORMAT`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    logging::init(LogSettings::from_env());
}
