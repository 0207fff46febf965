//! Tracing setup for the binary.
//!
//! stderr always; a daily-rolling file under `$RAGBOT_LOG_DIR` when it is set.
//! `RUST_LOG` overrides the default filter.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::log_format::SpanIdFormat;

pub const LOG_DIR_ENV: &str = "RAGBOT_LOG_DIR";
const LOG_FILE_PREFIX: &str = "ragbot.log";

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,ragbot=debug,cli=debug"
    } else {
        "warn"
    }
}

fn log_dir() -> Option<PathBuf> {
    std::env::var_os(LOG_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Installs the global subscriber. Keep the returned guard alive until exit so
/// buffered file lines are flushed.
pub fn init(verbose: bool) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let (file_layer, guard) = match log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .event_format(SpanIdFormat::new())
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .event_format(SpanIdFormat::new().with_target(false))
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}
