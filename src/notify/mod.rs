// src/notify/mod.rs

//! Notification dispatch.
//!
//! The orchestrator sends plain text through the [`Notifier`] trait; the
//! production backend is the Telegram Bot API.

pub mod telegram;

use async_trait::async_trait;

use crate::error::Result;

pub use telegram::TelegramNotifier;

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one text message.
    async fn send_text(&self, text: &str) -> Result<()>;
}
