//! # observatory-logging
//!
//! Tracing setup shared by the observatory binaries.
//!
//! ## Log Formats
//!
//! - `Pretty` - Human-readable output with ANSI colors
//! - `JSON` - Structured JSON lines
//! - `Compact` - Minimal single-line output
//!
//! Console output goes to stderr so that `--json` command output on stdout
//! stays machine readable.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize tracing for the application. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(level));

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Like [`init_tracing`], plus a daily-rolling JSON log file in `dir`.
///
/// The returned guard flushes pending writes when dropped and must be held
/// for the life of the process.
pub fn init_tracing_with_file(
    level: &str,
    format: LogFormat,
    dir: &Path,
) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, dir, "observatory.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer);

    let registry = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layer);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    tracing::info!(log_dir = %dir.display(), "File logging enabled");
    Ok(guard)
}
