//! Subscriber registration from `/start` commands.

use std::collections::{BTreeMap, BTreeSet};

use noticebot_core::traits::Messenger;
use noticebot_core::types::{ChatId, InboundCommand, OutgoingMessage, Subscriber};

pub fn welcome_text(name: &str) -> String {
    format!(
        "👋 Welcome, {name}!\n\n\
         You are now subscribed to receive notifications for new notices from National University 📢✨\n\n\
         You will receive notifications when new notices are published."
    )
}

/// Holds the subscriber set and name map for one run.
///
/// Registration is idempotent: a chat that is already subscribed is left
/// alone and gets no second welcome.
#[derive(Debug, Default)]
pub struct Registrar {
    subscribers: BTreeSet<ChatId>,
    names: BTreeMap<ChatId, String>,
    added: Vec<Subscriber>,
}

impl Registrar {
    pub fn new(subscribers: BTreeSet<ChatId>, names: BTreeMap<ChatId, String>) -> Self {
        Self {
            subscribers,
            names,
            added: Vec::new(),
        }
    }

    /// Register the sender of a subscribe command. Returns true if the
    /// chat was new. A failed welcome does not undo the registration.
    pub async fn handle(&mut self, messenger: &dyn Messenger, command: &InboundCommand) -> bool {
        if command.chat_id.is_empty() || self.subscribers.contains(&command.chat_id) {
            tracing::debug!("Chat {} already subscribed", command.chat_id);
            return false;
        }

        self.subscribers.insert(command.chat_id.clone());
        self.names
            .insert(command.chat_id.clone(), command.sender_name.clone());
        self.added.push(Subscriber {
            chat_id: command.chat_id.clone(),
            name: command.sender_name.clone(),
        });
        tracing::info!(
            "✅ New subscriber: {} ({})",
            command.chat_id,
            command.sender_name
        );

        let welcome = OutgoingMessage::reply(&command.chat_id, welcome_text(&command.sender_name));
        if let Err(e) = messenger.send(&welcome).await {
            tracing::error!("❌ Failed to send welcome to {}: {e}", command.chat_id);
        }
        true
    }

    pub fn subscribers(&self) -> &BTreeSet<ChatId> {
        &self.subscribers
    }

    pub fn names(&self) -> &BTreeMap<ChatId, String> {
        &self.names
    }

    /// Subscribers added during this run.
    pub fn added(&self) -> &[Subscriber] {
        &self.added
    }
}
