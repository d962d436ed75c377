//! Inbound command polling.

use noticebot_core::traits::CommandSource;
use noticebot_core::types::{InboundCommand, UpdateCursor};

/// Commands to handle this run and the cursor to persist afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub commands: Vec<InboundCommand>,
    pub cursor: UpdateCursor,
}

/// Fetch commands newer than `cursor`.
///
/// A failed poll is not an error for the run: it is logged and treated as
/// "no commands", leaving the cursor where it was.
pub async fn poll_commands(source: &dyn CommandSource, cursor: UpdateCursor) -> PollOutcome {
    let batch = match source.fetch_updates(cursor).await {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("❌ Polling commands failed: {e}");
            return PollOutcome {
                commands: Vec::new(),
                cursor,
            };
        }
    };

    let mut next = cursor;
    if let Some(max) = batch.max_update_id {
        next = next.advance(max);
    }

    let mut commands = Vec::with_capacity(batch.commands.len());
    for command in batch.commands {
        next = next.advance(command.update_id);
        if cursor.covers(command.update_id) {
            tracing::debug!("Skipping already handled update {}", command.update_id);
            continue;
        }
        commands.push(command);
    }

    if commands.is_empty() {
        tracing::info!("👍 No new commands");
    } else {
        tracing::info!("📩 {} new command(s), cursor {cursor} → {next}", commands.len());
    }

    PollOutcome {
        commands,
        cursor: next,
    }
}
