// src/services/notifier.rs

//! Message dispatch.
//!
//! `TelegramNotifier` posts to the Bot API `sendMessage` method.
//! `DryRunNotifier` only logs what would have been sent.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::TelegramConfig;

/// Consumer of formatted notification messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    async fn send(&self, text: &str) -> Result<()>;

    /// Notifier name for logging.
    fn name(&self) -> &'static str;
}

/// Sends messages to a Telegram chat through a bot.
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(client: Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    fn request<'a>(&'a self, text: &'a str) -> SendMessageRequest<'a> {
        SendMessageRequest {
            chat_id: &self.config.chat_id,
            text,
            disable_web_page_preview: self.config.disable_web_page_preview,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        // The endpoint carries the bot token, keep it out of error messages.
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.request(text))
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(AppError::notify(format!(
                "telegram returned {}: {}",
                status,
                api.description.unwrap_or_else(|| "no description".to_string())
            ))),
            None => Err(AppError::notify(format!(
                "telegram returned {status} with an unreadable body"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        log::info!("[dry-run] would send:\n{}", text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
