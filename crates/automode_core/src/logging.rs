//! Tracing setup.
//!
//! `RUST_LOG` wins when set. Otherwise the configured `log_level` applies to
//! this workspace's crates and everything else logs at `warn`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AutoModeConfig;

const LOG_FILE_PREFIX: &str = "automode";
const WORKSPACE_CRATES: [&str; 2] = ["automode_core", "automode_ai"];

/// Filter directives that raise this workspace's crates to `log_level`.
pub fn filter_directives(log_level: &str) -> String {
    std::iter::once("warn".to_string())
        .chain(WORKSPACE_CRATES.iter().map(|krate| format!("{krate}={log_level}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn env_filter(config: &AutoModeConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.log_level)))
}

/// Daily-rotated, non-blocking file writer under `logs_dir`.
fn file_writer(logs_dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory: {}", logs_dir.display()))?;
    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// File logging under `~/.automode/logs` plus compact console output.
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_logging(config: &AutoModeConfig) -> Result<WorkerGuard> {
    let (writer, guard) = file_writer(&AutoModeConfig::logs_dir()?)?;

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(fmt::layer().with_target(false).compact())
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

/// File-only logging into `logs_dir`, for hosts that own the log location.
pub fn init_logging_to_dir(logs_dir: &Path, config: &AutoModeConfig) -> Result<WorkerGuard> {
    let (writer, guard) = file_writer(logs_dir)?;

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
