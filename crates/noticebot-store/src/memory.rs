//! In-memory record store, used by tests and `--dry-run`.

use std::collections::{BTreeMap, BTreeSet};

use noticebot_core::error::Result;
use noticebot_core::traits::RecordStore;
use noticebot_core::types::{ChatId, Notice, UpdateCursor};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    notices: Vec<Notice>,
    subscribers: BTreeSet<ChatId>,
    cursor: UpdateCursor,
    names: BTreeMap<ChatId, String>,
    subscriber_saves: usize,
    cursor_saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot another store so a dry run starts from real state
    /// without writing back to it.
    pub fn seeded_from(other: &dyn RecordStore) -> Self {
        let (cursor, names) = other.load_cursor();
        Self {
            notices: other
                .load_known_urls()
                .into_iter()
                .map(|url| Notice::new("", url, ""))
                .collect(),
            subscribers: other.load_subscribers(),
            cursor,
            names,
            ..Self::default()
        }
    }

    pub fn with_subscribers<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = ChatId>,
    {
        self.subscribers.extend(ids);
        self
    }

    pub fn with_notices<I>(mut self, notices: I) -> Self
    where
        I: IntoIterator<Item = Notice>,
    {
        self.notices.extend(notices);
        self
    }

    pub fn with_cursor(mut self, cursor: UpdateCursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Logged notices in append order.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn subscriber_saves(&self) -> usize {
        self.subscriber_saves
    }

    pub fn cursor_saves(&self) -> usize {
        self.cursor_saves
    }
}

impl RecordStore for MemoryStore {
    fn load_known_urls(&self) -> BTreeSet<String> {
        self.notices.iter().map(|n| n.url.clone()).collect()
    }

    fn append_notice(&mut self, notice: &Notice) -> Result<()> {
        self.notices.push(notice.clone());
        Ok(())
    }

    fn load_subscribers(&self) -> BTreeSet<ChatId> {
        self.subscribers.clone()
    }

    fn save_subscribers(&mut self, subscribers: &BTreeSet<ChatId>) -> Result<()> {
        self.subscribers = subscribers.clone();
        self.subscriber_saves += 1;
        Ok(())
    }

    fn load_cursor(&self) -> (UpdateCursor, BTreeMap<ChatId, String>) {
        (self.cursor, self.names.clone())
    }

    fn save_cursor(
        &mut self,
        cursor: UpdateCursor,
        names: &BTreeMap<ChatId, String>,
    ) -> Result<()> {
        self.cursor = cursor;
        self.names = names.clone();
        self.cursor_saves += 1;
        Ok(())
    }
}
