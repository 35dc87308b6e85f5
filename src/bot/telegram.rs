// src/bot/telegram.rs

//! Telegram Bot API client.
//!
//! Only the methods the watcher needs: `getMe`, `sendMessage` and `getUpdates`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::bot::Messenger;
use crate::error::{AppError, Result};
use crate::models::BotConfig;

/// Slack on top of the long-poll timeout before the HTTP client gives up.
const REQUEST_SLACK_SECS: u64 = 10;

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// An incoming update. Only message updates are of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The bot's own account, from `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Telegram Bot API client.
pub struct TelegramBot {
    client: reqwest::Client,
    base_url: String,
    long_poll_secs: u64,
}

impl TelegramBot {
    /// Create a client; fails if no token is configured.
    pub fn new(config: &BotConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(AppError::config(
                "bot.token is empty (set it in the config file or EXPOSURE_BOT_TOKEN)",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.long_poll_secs + REQUEST_SLACK_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token.trim()
            ),
            long_poll_secs: config.long_poll_secs,
        })
    }

    /// Call a Bot API method with a JSON body.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Ok(result),
            Ok(api) => Err(AppError::Telegram {
                method: method.to_string(),
                description: api
                    .description
                    .unwrap_or_else(|| format!("status {}", status.as_u16())),
            }),
            // The token is part of the URL; report the method instead.
            Err(_) if !status.is_success() => Err(AppError::Status {
                url: method.to_string(),
                status: status.as_u16(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up the bot's own account.
    pub async fn get_me(&self) -> Result<BotUser> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let body = GetUpdates {
            offset,
            timeout: self.long_poll_secs,
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &body).await
    }

    /// Send a plain-text message.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        // Numeric ids go out as numbers, channel usernames as strings.
        let chat: Value = match chat_id.parse::<i64>() {
            Ok(id) => json!(id),
            Err(_) => json!(chat_id),
        };
        let body = json!({ "chat_id": chat, "text": text });
        let _: Value = self.call("sendMessage", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramBot {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        self.send_message(chat_id, text)
            .await
            .map_err(|e| AppError::delivery(chat_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn bot_for(server: &mockito::ServerGuard) -> TelegramBot {
        let config = BotConfig {
            token: "TOKEN".into(),
            api_url: server.url(),
            long_poll_secs: 0,
            delivery_concurrency: 1,
        };
        TelegramBot::new(&config).unwrap()
    }

    #[test]
    fn test_requires_token() {
        assert!(TelegramBot::new(&BotConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_send_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::PartialJson(json!({ "chat_id": 42, "text": "hello" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"result":{"message_id":7}}"#)
            .create_async()
            .await;

        bot_for(&server).send_message("42", "hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_delivery_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#)
            .create_async()
            .await;

        let err = bot_for(&server).send("42", "hello").await.unwrap_err();
        assert!(matches!(err, AppError::Delivery { ref chat_id, .. } if chat_id == "42"));
        assert!(err.to_string().contains("blocked"));
    }

    #[tokio::test]
    async fn test_get_me() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/getMe")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"result":{"id":1,"is_bot":true,"first_name":"Watch","username":"ExposureBot"}}"#)
            .create_async()
            .await;

        let me = bot_for(&server).get_me().await.unwrap();
        assert_eq!(me.username.as_deref(), Some("ExposureBot"));
    }

    #[tokio::test]
    async fn test_get_updates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/getUpdates")
            .match_body(Matcher::PartialJson(json!({ "offset": 10 })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":true,"result":[
                    {"update_id":10,"message":{"message_id":1,"chat":{"id":99,"type":"private"},"text":"/start"}},
                    {"update_id":11,"edited_message":{"message_id":1,"chat":{"id":99,"type":"private"}}}
                ]}"#,
            )
            .create_async()
            .await;

        let updates = bot_for(&server).get_updates(Some(10)).await.unwrap();
        assert_eq!(updates.len(), 2);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 99);
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert!(updates[1].message.is_none());
    }
}
