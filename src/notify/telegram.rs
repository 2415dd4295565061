// src/notify/telegram.rs

//! Telegram Bot API notifier.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::notify::Notifier;

/// Notifier delivering messages through the Telegram `sendMessage` method.
pub struct TelegramNotifier {
    token: String,
    chat_id: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Create a notifier for the given bot token and target chat.
    ///
    /// A missing chat id is not a startup failure; it fails each send
    /// instead.
    pub fn new(token: impl Into<String>, chat_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            chat_id,
            api_base: "https://api.telegram.org".to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        let chat_id = self
            .chat_id
            .as_deref()
            .ok_or_else(|| AppError::config("TELEGRAM_CHAT_ID is not set"))?;

        let body = json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!(
                "Telegram send failed ({status}): {body}"
            )));
        }
        Ok(())
    }
}
