//! Logging init: append to a file under the XDG state dir, or fall back to stderr.
//!
//! The filter comes from `DEPO_LOG`, then `RUST_LOG`, then a built-in default
//! that keeps the validation and upload crates at debug.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,depo_core=debug,depo=debug";
const FILTER_ENV: &str = "DEPO_LOG";

/// Location of the log file: `~/.local/state/depo/depo.log`. Creates the directory.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("depo")?;
    xdg_dirs
        .place_state_file("depo.log")
        .context("create log dir")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a subscriber that appends to the log file.
/// Returns Err when the state dir or file is unusable so the caller can use stderr.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "depo session started, logging to {}",
        path.display()
    );
    Ok(path)
}

/// Stderr-only logging, for when `init_logging` fails.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
