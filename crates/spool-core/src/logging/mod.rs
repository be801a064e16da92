//! Structured logging setup for `spoolctl`.
//!
//! - stdout is reserved for command payloads (JSON)
//! - stderr receives all log output, human-readable or JSON lines
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! host application's call.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives for the spool crates at `level`.
pub fn default_directives(level: LogLevel) -> String {
    format!("spool_core={level},spool_config={level},spoolctl={level}")
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Calling this twice
/// keeps the first subscriber.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.level)));

    let result = match config.format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(std::io::stderr().is_terminal()),
            )
            .try_init(),
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
