//! In-memory collaborators for engine tests.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use noticebot_core::error::{NoticeBotError, Result};
use noticebot_core::traits::{CommandSource, Messenger, NoticeSource, WorkflowTrigger};
use noticebot_core::types::{
    ChatId, InboundCommand, Notice, OutgoingMessage, UpdateBatch, UpdateCursor,
};

pub fn command(update_id: i64, chat: i64, text: &str) -> InboundCommand {
    InboundCommand {
        update_id,
        chat_id: ChatId::from(chat),
        sender_name: format!("User{chat}"),
        text: text.to_string(),
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 22).unwrap()
}

/// Command source + messenger. `updates: None` simulates a network failure.
#[derive(Default)]
pub struct FakeTelegram {
    updates: Option<UpdateBatch>,
    failing_chats: BTreeSet<ChatId>,
    requested: Mutex<Vec<UpdateCursor>>,
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl FakeTelegram {
    pub fn with_commands(commands: Vec<InboundCommand>) -> Self {
        let max_update_id = commands.iter().map(|c| c.update_id).max();
        Self::with_batch(UpdateBatch {
            commands,
            max_update_id,
        })
    }

    pub fn with_batch(batch: UpdateBatch) -> Self {
        Self {
            updates: Some(batch),
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, chat: i64) -> Self {
        self.failing_chats.insert(ChatId::from(chat));
        self
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: i64) -> Vec<String> {
        let chat = ChatId::from(chat);
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat)
            .map(|m| m.text)
            .collect()
    }

    pub fn requested(&self) -> Vec<UpdateCursor> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandSource for FakeTelegram {
    async fn fetch_updates(&self, cursor: UpdateCursor) -> Result<UpdateBatch> {
        self.requested.lock().unwrap().push(cursor);
        self.updates
            .clone()
            .ok_or_else(|| NoticeBotError::Http("connection refused".into()))
    }
}

#[async_trait]
impl Messenger for FakeTelegram {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        if self.failing_chats.contains(&message.chat_id) {
            return Err(NoticeBotError::Channel("bot was blocked by the user".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTrigger {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeTrigger {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowTrigger for FakeTrigger {
    async fn trigger(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NoticeBotError::Trigger {
                status: 401,
                body: "Bad credentials".into(),
            });
        }
        Ok(())
    }
}

/// `None` simulates a failed page fetch.
pub struct FakeBoard(pub Option<Vec<Notice>>);

#[async_trait]
impl NoticeSource for FakeBoard {
    async fn fetch_notices(&self) -> Result<Vec<Notice>> {
        self.0
            .clone()
            .ok_or_else(|| NoticeBotError::Http("timed out".into()))
    }
}
