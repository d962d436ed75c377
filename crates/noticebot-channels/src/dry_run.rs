//! Dry-run stand-ins: record what would have been sent, send nothing.

use async_trait::async_trait;
use noticebot_core::error::Result;
use noticebot_core::traits::{Messenger, WorkflowTrigger};
use noticebot_core::types::OutgoingMessage;

/// Logs each outgoing message at info level.
#[derive(Debug, Default)]
pub struct LoggingMessenger;

#[async_trait]
impl Messenger for LoggingMessenger {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        tracing::info!("📨 [dry-run] to {}:\n{}", message.chat_id, message.text);
        Ok(())
    }
}

/// Logs the trigger instead of dispatching the workflow.
#[derive(Debug, Default)]
pub struct LoggingTrigger;

#[async_trait]
impl WorkflowTrigger for LoggingTrigger {
    async fn trigger(&self) -> Result<()> {
        tracing::info!("🚀 [dry-run] workflow dispatch skipped");
        Ok(())
    }
}
