//! Seams between the run logic and the outside world.
//!
//! Network collaborators are async traits so the engine can be driven by
//! real HTTP clients in production and by in-memory fakes in tests.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatId, Notice, OutgoingMessage, UpdateBatch, UpdateCursor};

/// Source of inbound commands (Telegram `getUpdates`).
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Fetch every update strictly after `cursor`.
    async fn fetch_updates(&self, cursor: UpdateCursor) -> Result<UpdateBatch>;
}

/// Outbound message delivery (Telegram `sendMessage`).
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<()>;
}

/// External CI workflow that re-runs the scraper on demand.
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    async fn trigger(&self) -> Result<()>;
}

/// Where notices come from.
#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Notices in page order. An error means "nothing this run".
    async fn fetch_notices(&self) -> Result<Vec<Notice>>;
}

/// Persistence between runs: whole-collection loads and saves.
///
/// Loads never fail: a missing or corrupt store reads as empty/default.
pub trait RecordStore {
    /// Every notice URL ever persisted.
    fn load_known_urls(&self) -> BTreeSet<String>;

    /// Append one notice to the log.
    fn append_notice(&mut self, notice: &Notice) -> Result<()>;

    fn load_subscribers(&self) -> BTreeSet<ChatId>;

    /// Replace the subscriber set.
    fn save_subscribers(&mut self, subscribers: &BTreeSet<ChatId>) -> Result<()>;

    /// Last handled update and the chat-id → display-name map.
    fn load_cursor(&self) -> (UpdateCursor, BTreeMap<ChatId, String>);

    /// Replace the cursor and name map.
    fn save_cursor(&mut self, cursor: UpdateCursor, names: &BTreeMap<ChatId, String>)
    -> Result<()>;
}
