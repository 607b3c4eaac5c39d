//! Tracing setup for the dashboard binary
//!
//! Console output is compact and colored; the file log is plain text with
//! source locations, rotated daily under the app's data directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use plexiglass_core::LoggingSettings;

/// Crates that get debug output when RUST_LOG is unset
const WORKSPACE_CRATES: &[&str] = &["plexiglass_core", "plexiglass_services"];

/// Map a configured level name onto a tracing level.
///
/// Accepts the names used in settings files (`WARNING`, `CRITICAL`) as well
/// as tracing's own. Unknown names fall back to INFO.
pub fn level_filter(level: &str) -> LevelFilter {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => LevelFilter::TRACE,
        "DEBUG" => LevelFilter::DEBUG,
        "WARN" | "WARNING" => LevelFilter::WARN,
        "ERROR" | "CRITICAL" | "FATAL" => LevelFilter::ERROR,
        "OFF" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Filter used when RUST_LOG is unset: the configured level globally,
/// workspace crates at least at debug.
pub fn default_env_filter(level: &str) -> EnvFilter {
    let base = level_filter(level);
    let crate_level = base.max(LevelFilter::DEBUG);

    WORKSPACE_CRATES
        .iter()
        .fold(EnvFilter::new(base.to_string()), |filter, name| {
            match format!("{}={}", name, crate_level).parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => filter,
            }
        })
}

/// RUST_LOG takes precedence over the configured level
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_env_filter(level))
}

/// Default location for log files
pub fn default_logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plexiglass")
        .join("logs")
}

/// File name prefix derived from the configured file name (`plexiglass.log` -> `plexiglass`)
fn file_prefix(file: &str) -> &str {
    let prefix = file.strip_suffix(".log").unwrap_or(file);
    if prefix.is_empty() {
        "plexiglass"
    } else {
        prefix
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program.
pub fn init_tracing(settings: &LoggingSettings, logs_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create logs directory {}", logs_dir.display()))?;

    // Files look like plexiglass.2026-01-22.log
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_prefix(&settings.file))
        .filename_suffix("log")
        .max_log_files(settings.backup_count as usize + 1)
        .build(logs_dir)
        .context("Failed to create log file appender")?;
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_ansi(true)
        .compact()
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(&settings.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!(
        "[Logging] Initialized (level={}, dir={})",
        settings.level,
        logs_dir.display()
    );
    Ok(guard)
}
