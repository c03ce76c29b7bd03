//! Log output for checkup-bot.
//!
//! `start` runs for days, logging down alerts, dropped replies and Telegram
//! poll failures, so [`init_production`] keeps a JSON trail under
//! `~/.checkup-bot/logs/` (one file per day) and mirrors it to stderr.
//! `validate` only prints a verdict, so [`init_cli`] writes to stderr alone.
//!
//! `RUST_LOG` picks the level; unset means `info`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::config_dir;

/// Rotated files are named `checkup-bot.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "checkup-bot.log";

/// Held by `start` for the life of the process. Dropping it flushes pending
/// alert and poll logs to disk.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Where `start` writes its log files (`~/.checkup-bot/logs`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn logs_dir() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("logs"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logging for `start`: daily JSON files in `logs_dir` plus stderr.
///
/// # Errors
///
/// Fails if `logs_dir` cannot be created or another subscriber already owns
/// the process; the directory exists either way.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(LoggingGuard { _guard: guard })
}

/// Logging for `validate`. Calling it again is a no-op.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
