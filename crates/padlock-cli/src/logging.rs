//! Log filter selection for the emulator binary.

use tracing_subscriber::EnvFilter;

/// Build the log filter.
///
/// A parseable `RUST_LOG` value wins, then the `--log-level` argument, then
/// plain `info`.
pub fn filter(rust_log: Option<String>, log_level: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(log_level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
