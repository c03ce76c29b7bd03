//! Configuration loading and validation.
//!
//! The bot reads a human-owned `config.toml`. Secrets never live in it: the
//! file names the environment variable holding the bot token, and a `.env`
//! next to the config (or in the working directory) is loaded first.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::dispatch::DispatchConfig;
use crate::notifier::NotifierSettings;
use crate::responder::ResponderConfig;
use crate::transport::telegram::MAX_POLL_TIMEOUT_SECS;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for [`Config`].
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// A value is present but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The token environment variable is unset or empty.
    #[error("environment variable {0} is not set")]
    MissingToken(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chat connection settings.
    pub chat: ChatConfig,

    /// Alert formatting.
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// Command table and phrasing.
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Reply delivery limits.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Chat connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Environment variable name holding the bot token.
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Channel that receives down alerts.
    pub channel_id: String,

    /// Long-poll timeout for inbound updates, in seconds (at most 50).
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u32,
}

/// Alert formatting.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    /// Append "last checked <timestamp>" to down alerts.
    #[serde(default = "default_include_timestamp")]
    pub include_timestamp: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            include_timestamp: default_include_timestamp(),
        }
    }
}

// Default value functions for serde

fn default_bot_token_env() -> String {
    "CHECKUP_BOT_TOKEN".to_owned()
}
fn default_poll_timeout_secs() -> u32 {
    10
}
fn default_include_timestamp() -> bool {
    true
}

impl Config {
    /// Reject values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.channel_id.trim().is_empty() {
            return Err(ConfigError::Invalid("chat.channel_id is empty".to_owned()));
        }
        if self.chat.bot_token_env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "chat.bot_token_env is empty".to_owned(),
            ));
        }
        if self.chat.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "chat.poll_timeout_secs must be at most {MAX_POLL_TIMEOUT_SECS}"
            )));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.queue_capacity must be at least 1".to_owned(),
            ));
        }
        if self.dispatch.max_concurrent_sends == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.max_concurrent_sends must be at least 1".to_owned(),
            ));
        }
        if self.responder.greeting_triggers.iter().all(|t| t.is_empty())
            && self.responder.help_trigger.is_empty()
        {
            return Err(ConfigError::Invalid(
                "responder has no triggers".to_owned(),
            ));
        }
        Ok(())
    }

    /// Notifier settings derived from this config.
    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            channel_id: self.chat.channel_id.trim().to_owned(),
            include_timestamp: self.alerts.include_timestamp,
            responder: self.responder.clone(),
            dispatch: self.dispatch.clone(),
            rng_seed: None,
        }
    }

    /// Read the bot token from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] if the variable is unset or blank.
    pub fn bot_token(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.chat.bot_token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_owned()),
            _ => Err(ConfigError::MissingToken(self.chat.bot_token_env.clone())),
        }
    }
}

/// Load and validate the config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `.env` files: first next to `config_path`, then the working directory.
///
/// Variables already set in the environment win. Missing files are fine.
pub fn load_dotenv(config_path: &Path) {
    if let Some(dir) = config_path.parent() {
        let _ = dotenvy::from_path(dir.join(".env"));
    }
    let _ = dotenvy::dotenv();
}

/// Resolve the default config directory (`~/.checkup-bot/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".checkup-bot"))
}
