//! checkup-bot: relays uptime check alerts to a chat channel.
//!
//! The check pipeline pushes [`check::CheckResult`] batches into
//! [`notifier::Notifier::notify`], which alerts once per healthy→down
//! transition. In the background the notifier listens on a
//! [`transport::Transport`] and answers a couple of chat commands.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod check;
pub mod config;
pub mod logging;

pub mod dispatch;
pub mod notifier;
pub mod responder;
pub mod tracker;
pub mod transport;
