// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenHive orchestrator daemon (hived)
//!
//! Loads the trusted config mapping, wires the tmux driver and the
//! reasoning runner into the orchestrator, and runs the control loop
//! until SIGTERM/SIGINT.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use hive_adapters::{CliReasoningRunner, MuxAdapter, TmuxDriver};
use hive_core::SystemClock;
use hive_engine::{HiveConfig, Orchestrator};
use std::path::{Path, PathBuf};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Fixed multiplexer session hosting all worker windows.
const SESSION_NAME: &str = "openhive-orch";

#[derive(Parser)]
#[command(name = "hived", version, about = "OpenHive orchestrator daemon")]
struct Args {
    /// Path to the config file (TOML). Defaults to ~/.openhive/config.toml.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log to stderr instead of the log file.
    #[arg(long)]
    stderr: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let log_path = hive_storage::paths::default_log_dir().join("hived.log");
    rotate_log_if_needed(&log_path);
    let _log_guard = setup_logging(&config, &log_path, args.stderr)?;

    info!("starting hived");

    let mux = TmuxDriver::new(SESSION_NAME);
    // A missing or broken multiplexer is fatal: nothing can run without it.
    mux.ensure_session().await?;

    let reasoning = reasoning_runner(&config);
    let mut orchestrator = Orchestrator::new(mux, reasoning, SystemClock, config)?;

    // Trigger graceful shutdown on SIGTERM/SIGINT.
    let shutdown = orchestrator.shutdown_signal();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
        shutdown.trigger();
    });

    orchestrator.run().await;
    info!("hived stopped");
    Ok(())
}

/// Load the config mapping: explicit path, else the default location,
/// else built-in defaults.
fn load_config(path: Option<&Path>) -> Result<HiveConfig, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = hive_storage::paths::hive_root().join("config.toml");
            if !default.exists() {
                return Ok(HiveConfig::default());
            }
            default
        }
    };
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let config = toml::from_str(&text)
        .map_err(|e| format!("cannot parse {}: {}", path.display(), e))?;
    Ok(config)
}

/// Build the reasoning runner from the configured command line, if any.
fn reasoning_runner(config: &HiveConfig) -> Option<CliReasoningRunner> {
    let tool = config.orchestrator.reasoning_tool.as_deref()?;
    let mut parts = tool.split_whitespace();
    let command = parts.next()?;
    Some(CliReasoningRunner::new(
        command,
        parts.map(String::from).collect(),
    ))
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (hived.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `hived.log` -> `hived.log.1` -> `hived.log.2` -> `hived.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently
/// ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &HiveConfig,
    log_path: &Path,
    stderr: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));

    if stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    }

    let parent = log_path.parent().ok_or("log path has no parent")?;
    std::fs::create_dir_all(parent)?;
    let file_name = log_path.file_name().ok_or("log path has no file name")?;

    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
