//! Fan-out of one message to every subscriber.
//! Sequential, paced, and tolerant of individual delivery failures.

use std::collections::BTreeSet;
use std::time::Duration;

use noticebot_core::traits::Messenger;
use noticebot_core::types::{ChatId, OutgoingMessage};

/// Aggregate delivery result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: Vec<(ChatId, String)>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed.len()
    }
}

/// Sends one message per subscriber with a fixed pause between sends to
/// stay under the Bot API rate limit.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    delay: Duration,
}

impl Broadcaster {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn broadcast(
        &self,
        messenger: &dyn Messenger,
        subscribers: &BTreeSet<ChatId>,
        text: &str,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if subscribers.is_empty() {
            tracing::info!("🤷 No subscribers to notify");
            return report;
        }

        tracing::info!("✉️ Sending notification to {} subscribers...", subscribers.len());
        for (i, chat_id) in subscribers.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match messenger.send(&OutgoingMessage::broadcast(chat_id, text)).await {
                Ok(()) => {
                    report.sent += 1;
                    tracing::debug!("✅ Sent to {chat_id}");
                }
                Err(e) => {
                    tracing::warn!("❌ Failed to send to {chat_id}: {e}");
                    report.failed.push((chat_id.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            "✅ Sent to {} subscribers, ❌ failed for {}",
            report.sent,
            report.failed.len()
        );
        report
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
