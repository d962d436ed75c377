//! Telegram Bot channel: `getUpdates` polling + `sendMessage` delivery.
//!
//! A run polls once and exits; there is no background polling loop. The
//! offset comes from the persisted cursor, so the same client serves both
//! the full run and the relay-only run.

use std::time::Duration;

use async_trait::async_trait;
use noticebot_core::config::TelegramConfig;
use noticebot_core::error::{NoticeBotError, Result};
use noticebot_core::traits::{CommandSource, Messenger};
use noticebot_core::types::{ChatId, InboundCommand, OutgoingMessage, UpdateBatch, UpdateCursor};
use serde::{Deserialize, Serialize};

/// Shown when a sender has no first name.
const FALLBACK_SENDER_NAME: &str = "Friend";

/// Extra headroom on top of the long-poll timeout.
const POLL_GRACE_SECS: u64 = 5;

/// Telegram Bot API client.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Long-poll for updates with id >= `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<TelegramUpdate>> {
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.config.poll_timeout_secs.to_string()),
            ])
            .timeout(Duration::from_secs(
                self.config.poll_timeout_secs + POLL_GRACE_SECS,
            ))
            .send()
            .await
            .map_err(|e| NoticeBotError::Http(format!("Telegram getUpdates failed: {e}")))?;

        let body: TelegramApiResponse<Vec<TelegramUpdate>> = response
            .json()
            .await
            .map_err(|e| NoticeBotError::Channel(format!("Invalid Telegram response: {e}")))?;

        if !body.ok {
            return Err(NoticeBotError::Channel(format!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            )));
        }

        Ok(body.result.unwrap_or_default())
    }

    /// Send a plain-text message.
    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        disable_preview: bool,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id.as_str(),
            "text": text,
        });
        if disable_preview {
            body["disable_web_page_preview"] = serde_json::Value::Bool(true);
        }

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .send()
            .await
            .map_err(|e| NoticeBotError::Http(format!("sendMessage failed: {e}")))?;

        let status = response.status();
        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| NoticeBotError::Channel(format!("Invalid send response ({status}): {e}")))?;

        if !result.ok {
            return Err(NoticeBotError::Channel(format!(
                "Send failed ({status}): {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandSource for TelegramChannel {
    async fn fetch_updates(&self, cursor: UpdateCursor) -> Result<UpdateBatch> {
        let updates = self.get_updates(cursor.next_offset()).await?;
        Ok(UpdateBatch {
            max_update_id: updates.iter().map(|u| u.update_id).max(),
            commands: updates.iter().filter_map(TelegramUpdate::to_inbound).collect(),
        })
    }
}

#[async_trait]
impl Messenger for TelegramChannel {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        self.send_message(&message.chat_id, &message.text, message.disable_preview)
            .await
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    #[serde(default)]
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
}

impl TelegramUpdate {
    /// Text messages only; joins, edits, and stickers carry no command.
    pub fn to_inbound(&self) -> Option<InboundCommand> {
        let msg = self.message.as_ref()?;
        let text = msg.text.as_ref()?;

        let sender_name = msg
            .from
            .as_ref()
            .map(|u| u.first_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_SENDER_NAME)
            .to_string();

        Some(InboundCommand {
            update_id: self.update_id,
            chat_id: ChatId::from(msg.chat.id),
            sender_name,
            text: text.clone(),
        })
    }
}
