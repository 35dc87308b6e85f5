//! Messaging bot integration.
//!
//! - `Messenger`: outbound text delivery used by the notifier
//! - `TelegramBot`: Bot API client (send + long-poll updates)
//! - `Command`: `/start`, `/stop`, `/last_updated` handling
//! - `run_command_listener`: update loop dispatching commands

mod commands;
mod listener;
mod telegram;

use async_trait::async_trait;

use crate::error::Result;

pub use commands::{Command, STOP_REPLY, START_REPLY, handle_command};
pub use listener::run_command_listener;
pub use telegram::{BotUser, Chat, Message, TelegramBot, Update};

/// Outbound message transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send `text` to one chat. Best effort; no delivery receipt.
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}
