//! checkup-bot CLI entry point.
//!
//! `start` runs the bot over Telegram and feeds check-result batches read
//! from stdin (one JSON array per line) into the notifier. `validate` loads
//! the config and exits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use checkup_bot::check::parse_batch;
use checkup_bot::config::{config_dir, load_config, load_dotenv};
use checkup_bot::notifier::{LoopExit, Notifier};
use checkup_bot::transport::telegram::{TelegramSettings, TelegramTransport};
use checkup_bot::transport::Transport;

/// checkup-bot: uptime alerts and chat commands.
#[derive(Parser)]
#[command(name = "checkup-bot", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the bot, reading check results from stdin.
    Start {
        /// Path to config.toml (default: ~/.checkup-bot/config.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load and validate the config, then exit.
    Validate {
        /// Path to config.toml (default: ~/.checkup-bot/config.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start { config } => handle_start(config).await,
        Command::Validate { config } => handle_validate(config),
    }
}

fn resolve_config_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(config_dir()?.join("config.toml")),
    }
}

/// Run the bot until stdin closes or the event loop stops for good.
async fn handle_start(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = resolve_config_path(config_path)?;

    let _logging_guard = checkup_bot::logging::init_production(&checkup_bot::logging::logs_dir()?)?;

    load_dotenv(&config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let token = config.bot_token().context("bot token unavailable")?;

    let transport: Arc<dyn Transport> = Arc::new(
        TelegramTransport::new(TelegramSettings {
            bot_token: token,
            poll_timeout_secs: config.chat.poll_timeout_secs,
        })
        .context("failed to create telegram transport")?,
    );
    let (notifier, mut event_loop) = Notifier::start(transport, config.notifier_settings());

    info!(
        config = %config_path.display(),
        channel_id = %notifier.channel_id(),
        "checkup-bot started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(line) => feed_line(&notifier, &line).await,
                    None => {
                        info!("stdin closed, shutting down");
                        break;
                    }
                }
            }
            exit = &mut event_loop => {
                match exit.context("event loop panicked")? {
                    LoopExit::AuthFailed => {
                        error!("chat authentication failed, commands disabled; still reading check results");
                    }
                    other => warn!(exit = ?other, "event loop stopped"),
                }
                // The loop is gone but notify must keep running; keep
                // reading check results until stdin closes.
                while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
                    feed_line(&notifier, &line).await;
                }
                break;
            }
        }
    }

    Ok(())
}

/// Decode one stdin line and hand it to the notifier.
async fn feed_line(notifier: &Notifier, line: &str) {
    match parse_batch(line) {
        Ok(None) => {}
        Ok(Some(results)) => {
            let report = notifier.notify(&results).await;
            debug!(
                checked = report.checked,
                alerted = report.alerted,
                failed = report.failed,
                "check batch processed"
            );
        }
        Err(e) => warn!(error = %e, "skipping malformed check batch"),
    }
}

/// Validate the config and print a short summary.
fn handle_validate(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    checkup_bot::logging::init_cli();

    let config_path = resolve_config_path(config_path)?;
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    info!(
        config = %config_path.display(),
        channel_id = %config.chat.channel_id,
        token_env = %config.chat.bot_token_env,
        "config is valid"
    );
    Ok(())
}
