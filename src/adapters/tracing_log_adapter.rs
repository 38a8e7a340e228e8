//! `LogPort` backed by `tracing`.

use crate::ports::log_port::{LogLevel, LogPort};
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
/// Calling this more than once is harmless.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub struct TracingLogAdapter;

impl LogPort for TracingLogAdapter {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!(target: "periodsim", "{message}"),
            LogLevel::Warning => tracing::warn!(target: "periodsim", "{message}"),
            LogLevel::Error => tracing::error!(target: "periodsim", "{message}"),
        }
    }
}
