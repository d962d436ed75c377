//! Domain types shared across NoticeBot crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical chat identifier.
///
/// Telegram hands out numeric ids, the subscriber file has held both numbers
/// and strings over time. Everything is normalized to the trimmed decimal
/// string at the boundary so set and map lookups never miss on type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id of the last inbound update that has been handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateCursor(i64);

impl UpdateCursor {
    pub fn new(last_update_id: i64) -> Self {
        Self(last_update_id)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Offset to request from the command source: strictly after the cursor.
    pub fn next_offset(self) -> i64 {
        self.0 + 1
    }

    /// Whether an update id has already been handled by a previous run.
    pub fn covers(self, update_id: i64) -> bool {
        update_id <= self.0
    }

    /// Move forward to `update_id`; never moves backwards.
    pub fn advance(self, update_id: i64) -> Self {
        Self(self.0.max(update_id))
    }
}

impl fmt::Display for UpdateCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A notice-board entry as scraped. `url` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub url: String,
    /// Raw date text from the page, e.g. "October 22, 2025".
    pub date: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, url: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            date: date.into(),
        }
    }
}

/// A user who receives notice broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: ChatId,
    pub name: String,
}

/// One text message pulled from the command source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub update_id: i64,
    pub chat_id: ChatId,
    pub sender_name: String,
    pub text: String,
}

impl InboundCommand {
    pub fn kind(&self) -> CommandKind {
        CommandKind::classify(&self.text)
    }
}

/// What an inbound command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Subscribe,
    Trigger,
    Unknown,
}

impl CommandKind {
    const SUBSCRIBE_TOKENS: &'static [&'static str] = &["/start", "start"];
    const TRIGGER_TOKENS: &'static [&'static str] = &["scrape", "/scrape"];

    /// Classify free text after trimming and lower-casing it.
    pub fn classify(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        if Self::SUBSCRIBE_TOKENS.contains(&normalized.as_str()) {
            Self::Subscribe
        } else if Self::TRIGGER_TOKENS.contains(&normalized.as_str()) {
            Self::Trigger
        } else {
            Self::Unknown
        }
    }
}

/// Result of one poll of the command source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    /// Text messages, in the order the source returned them.
    pub commands: Vec<InboundCommand>,
    /// Highest update id in the response, including updates without text.
    pub max_update_id: Option<i64>,
}

/// A message to deliver to one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub disable_preview: bool,
}

impl OutgoingMessage {
    pub fn reply(chat_id: &ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.clone(),
            text: text.into(),
            disable_preview: false,
        }
    }

    /// Broadcast text: link previews off so a list of notices stays compact.
    pub fn broadcast(chat_id: &ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.clone(),
            text: text.into(),
            disable_preview: true,
        }
    }
}
