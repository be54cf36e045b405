use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// The guard must live for the whole process or buffered log lines are lost.
static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn log_dir() -> PathBuf {
    std::env::temp_dir().join("p4menu")
}

/// Initialize file-based logging.
///
/// Diagnostics go to a daily-rotated file under the temp dir so the terminal
/// stays reserved for user-facing output. Filter via `P4MENU_LOG`
/// (env-filter syntax, default `info`).
pub fn init() -> Result<()> {
    let dir = log_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, "p4menu.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = GUARD.set(guard);

    let filter = EnvFilter::try_from_env("P4MENU_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(())
}
