//! Prefix-matched chat commands.
//!
//! The responder owns its configuration and a single RNG seeded once at
//! construction. It never sends anything itself; it returns the outbound
//! messages a command produces and lets the caller deliver them.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::transport::{InboundMessage, OutboundMessage};

/// Greeting prefixes used when none are configured.
const DEFAULT_GREETING_PREFIXES: [&str; 5] = ["Hi", "Hello", "Howdy", "Wazzzup", "Hey"];

/// Responder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderConfig {
    /// Lowercase prefixes that trigger a greeting.
    #[serde(default = "default_greeting_triggers")]
    pub greeting_triggers: Vec<String>,

    /// Lowercase prefix that triggers the help message.
    #[serde(default = "default_help_trigger")]
    pub help_trigger: String,

    /// Words a greeting may start with, picked uniformly at random.
    #[serde(default = "default_greeting_prefixes")]
    pub greeting_prefixes: Vec<String>,

    /// Reply to the help trigger.
    #[serde(default = "default_help_text")]
    pub help_text: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            greeting_triggers: default_greeting_triggers(),
            help_trigger: default_help_trigger(),
            greeting_prefixes: default_greeting_prefixes(),
            help_text: default_help_text(),
        }
    }
}

fn default_greeting_triggers() -> Vec<String> {
    vec!["hi bot".to_owned(), "hello bot".to_owned()]
}
fn default_help_trigger() -> String {
    "bot help".to_owned()
}
fn default_greeting_prefixes() -> Vec<String> {
    DEFAULT_GREETING_PREFIXES
        .iter()
        .map(|p| (*p).to_owned())
        .collect()
}
fn default_help_text() -> String {
    "How can I help you?".to_owned()
}

/// Commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Say hello back to the sender.
    Greet,
    /// Show the help text.
    Help,
}

/// Maps inbound chat text to outbound replies.
pub struct Responder {
    config: ResponderConfig,
    rng: Mutex<StdRng>,
}

impl Responder {
    /// Create a responder with an entropy-seeded RNG.
    pub fn new(config: ResponderConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a responder with a fixed seed, for reproducible greetings.
    pub fn with_seed(config: ResponderConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut config: ResponderConfig, rng: StdRng) -> Self {
        config.greeting_triggers = config
            .greeting_triggers
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        config.help_trigger = config.help_trigger.to_lowercase();
        if config.greeting_prefixes.is_empty() {
            config.greeting_prefixes = default_greeting_prefixes();
        }
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Effective configuration (triggers lower-cased).
    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Match `text` against the command table. First match wins.
    pub fn classify(&self, text: &str) -> Option<Command> {
        let lowered = text.to_lowercase();
        if self
            .config
            .greeting_triggers
            .iter()
            .any(|t| lowered.starts_with(t.as_str()))
        {
            return Some(Command::Greet);
        }
        if !self.config.help_trigger.is_empty() && lowered.starts_with(&self.config.help_trigger) {
            return Some(Command::Help);
        }
        None
    }

    /// Replies to `message`, in delivery order. Empty when nothing matched.
    pub fn respond(&self, message: &InboundMessage) -> Vec<OutboundMessage> {
        match self.classify(&message.text) {
            Some(Command::Greet) => vec![
                OutboundMessage::typing(&message.channel_id),
                OutboundMessage::text(&message.channel_id, self.greeting(&message.sender_id)),
            ],
            Some(Command::Help) => vec![OutboundMessage::text(
                &message.channel_id,
                &self.config.help_text,
            )],
            None => Vec::new(),
        }
    }

    /// `"<prefix> @<sender_id>!"` with a random prefix.
    ///
    /// The `@<sender_id>` part is plain text. Platforms that address users by
    /// numeric id (Telegram) do not turn it into a mention, so the sender is
    /// named but not notified; a notifying mention needs platform markup such
    /// as a `tg://user?id=` link with a parse mode, which plain-text sends do
    /// not use.
    pub fn greeting(&self, sender_id: &str) -> String {
        let prefix = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            self.config
                .greeting_prefixes
                .choose(&mut *rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_GREETING_PREFIXES[0].to_owned())
        };
        format!("{prefix} @{sender_id}!")
    }
}
