// src/bot/listener.rs

//! Command listener.
//!
//! Long-polls the bot API for messages and answers commands. Runs beside the
//! poll loop and only touches the subscriber set and the page marker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::bot::{Command, Messenger, TelegramBot, Update, handle_command};
use crate::context::AppContext;

/// Pause after a failed update poll.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Run until `shutdown` flips to `true` (or its sender is dropped).
pub async fn run_command_listener(
    bot: Arc<TelegramBot>,
    ctx: Arc<AppContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    let username = match bot.get_me().await {
        Ok(me) => me.username,
        Err(error) => {
            log::warn!("getMe failed, ignoring @-addressed commands: {}", error);
            None
        }
    };
    log::info!(
        "Command listener started as @{}",
        username.as_deref().unwrap_or("unknown")
    );
    let mut offset: Option<i64> = None;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let updates = tokio::select! {
            result = bot.get_updates(offset) => result,
            _ = shutdown.changed() => break,
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    dispatch(&bot, &ctx, username.as_deref(), update).await;
                }
            }
            Err(error) => {
                log::warn!("Polling bot updates failed: {}", error);
                tokio::select! {
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                    _ = shutdown.changed() => break,
                }
            }
        }
    }

    log::info!("Command listener stopped");
}

async fn dispatch(bot: &TelegramBot, ctx: &AppContext, username: Option<&str>, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let Some(command) = message
        .text
        .as_deref()
        .and_then(|text| Command::parse(text, username))
    else {
        return;
    };
    let chat_id = message.chat.id.to_string();
    log::debug!("Command {:?} from {}", command, chat_id);

    match handle_command(command, &chat_id, ctx.store.as_ref(), &ctx.keys).await {
        Ok(reply) => {
            if let Err(error) = bot.send(&chat_id, &reply).await {
                log::warn!("Reply to {} failed: {}", chat_id, error);
            }
        }
        Err(error) => {
            log::error!(
                "Command {:?} from {} failed ({}): {}",
                command,
                chat_id,
                error.kind(),
                error
            );
        }
    }
}
