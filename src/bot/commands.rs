// src/bot/commands.rs

//! Subscriber-facing bot commands.

use crate::error::Result;
use crate::storage::{KeyValueStore, StoreKeys};

pub const START_REPLY: &str =
    "Thanks! Please note this information is provided on a best effort basis!";
pub const STOP_REPLY: &str = "Thanks!";

/// Commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Subscribe the calling chat
    Start,
    /// Unsubscribe the calling chat
    Stop,
    /// Report the stored page marker
    LastUpdated,
}

impl Command {
    /// Parse a message text.
    ///
    /// Group chats address commands as `/cmd@BotName`. A suffixed command
    /// counts only when the suffix is `bot_username`; with no known username
    /// every suffixed command is ignored.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let token = token.strip_prefix('/')?;
        let name = match token.split_once('@') {
            Some((name, target)) => {
                let ours = bot_username
                    .map(|own| own.trim_start_matches('@'))
                    .is_some_and(|own| own.eq_ignore_ascii_case(target));
                if !ours {
                    return None;
                }
                name
            }
            None => token,
        };
        match name {
            "start" => Some(Command::Start),
            "stop" => Some(Command::Stop),
            "last_updated" => Some(Command::LastUpdated),
            _ => None,
        }
    }
}

/// Apply a command for `chat_id` and return the reply text.
pub async fn handle_command(
    command: Command,
    chat_id: &str,
    store: &dyn KeyValueStore,
    keys: &StoreKeys,
) -> Result<String> {
    match command {
        Command::Start => {
            if store.set_add(&keys.subscribers(), chat_id).await? {
                log::info!("Subscribed {}", chat_id);
            }
            Ok(START_REPLY.to_string())
        }
        Command::Stop => {
            if store.set_remove(&keys.subscribers(), chat_id).await? {
                log::info!("Unsubscribed {}", chat_id);
            }
            Ok(STOP_REPLY.to_string())
        }
        Command::LastUpdated => {
            let marker = store.get(&keys.marker()).await?;
            Ok(format!(
                "Last Updated: {}",
                marker.as_deref().unwrap_or("unknown")
            ))
        }
    }
}
