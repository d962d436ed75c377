//! `scrape` command handling: acknowledge, then dispatch the workflow.

use noticebot_core::traits::{Messenger, WorkflowTrigger};
use noticebot_core::types::{InboundCommand, OutgoingMessage};

pub const ACK_TEXT: &str = "🔄 Scrape workflow is starting, please wait...";
pub const TRIGGER_OK_TEXT: &str = "✅ Workflow triggered successfully!";
pub const USAGE_TEXT: &str = "👋 Hello! Send 'scrape' to run the notice workflow.";

pub fn trigger_failed_text(status: &str) -> String {
    format!("❌ Workflow trigger failed (Status: {status})")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Fired,
    Failed(String),
}

impl TriggerOutcome {
    pub fn is_fired(&self) -> bool {
        matches!(self, Self::Fired)
    }
}

/// Relays trigger commands to the workflow.
pub struct Dispatcher<'a> {
    messenger: &'a dyn Messenger,
    trigger: &'a dyn WorkflowTrigger,
    report_outcome: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(messenger: &'a dyn Messenger, trigger: &'a dyn WorkflowTrigger) -> Self {
        Self {
            messenger,
            trigger,
            report_outcome: false,
        }
    }

    /// Also tell the chat whether the dispatch was accepted (relay mode).
    pub fn reporting_outcome(mut self) -> Self {
        self.report_outcome = true;
        self
    }

    /// Acknowledge and dispatch exactly once. Neither a failed reply nor a
    /// failed dispatch is retried.
    pub async fn handle(&self, command: &InboundCommand) -> TriggerOutcome {
        tracing::info!(
            "⚡ Scrape command from {} ({})",
            command.sender_name,
            command.chat_id
        );

        self.reply(command, ACK_TEXT).await;

        let outcome = match self.trigger.trigger().await {
            Ok(()) => TriggerOutcome::Fired,
            Err(e) => {
                tracing::error!("❌ Workflow trigger failed: {e}");
                TriggerOutcome::Failed(e.status_label())
            }
        };

        if self.report_outcome {
            let text = match &outcome {
                TriggerOutcome::Fired => TRIGGER_OK_TEXT.to_string(),
                TriggerOutcome::Failed(status) => trigger_failed_text(status),
            };
            self.reply(command, &text).await;
        }
        outcome
    }

    /// Answer a `/start` from a chat that is already subscribed (relay mode).
    pub async fn send_usage(&self, command: &InboundCommand) {
        self.reply(command, USAGE_TEXT).await;
    }

    async fn reply(&self, command: &InboundCommand, text: &str) {
        let message = OutgoingMessage::reply(&command.chat_id, text);
        match self.messenger.send(&message).await {
            Ok(()) => tracing::debug!("📨 Sent reply to {}", command.chat_id),
            Err(e) => tracing::error!("❌ Reply to {} failed: {e}", command.chat_id),
        }
    }
}
