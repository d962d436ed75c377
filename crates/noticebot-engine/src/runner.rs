//! One bot invocation, wired from its collaborators.

use std::sync::Arc;

use chrono::NaiveDate;
use noticebot_core::traits::{CommandSource, Messenger, NoticeSource, RecordStore, WorkflowTrigger};
use noticebot_core::types::{CommandKind, Subscriber, UpdateCursor};

use crate::broadcast::Broadcaster;
use crate::dedup::{DedupReport, NotificationEngine};
use crate::dispatcher::{Dispatcher, TriggerOutcome};
use crate::poller::poll_commands;
use crate::registrar::Registrar;

/// Outcome of a full run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub commands: usize,
    pub new_subscribers: Vec<Subscriber>,
    pub triggers_fired: usize,
    pub triggers_failed: usize,
    pub cursor: UpdateCursor,
    pub dedup: DedupReport,
    pub store_errors: Vec<String>,
}

/// Outcome of a relay-only run.
#[derive(Debug, Clone, Default)]
pub struct RelaySummary {
    pub commands: usize,
    pub new_subscribers: Vec<Subscriber>,
    pub triggers_fired: usize,
    pub triggers_failed: usize,
    pub cursor: UpdateCursor,
    pub store_errors: Vec<String>,
}

pub struct Runner<S: RecordStore> {
    store: S,
    commands: Arc<dyn CommandSource>,
    messenger: Arc<dyn Messenger>,
    trigger: Arc<dyn WorkflowTrigger>,
    board: Arc<dyn NoticeSource>,
    engine: NotificationEngine,
}

impl<S: RecordStore> Runner<S> {
    pub fn new(
        store: S,
        commands: Arc<dyn CommandSource>,
        messenger: Arc<dyn Messenger>,
        trigger: Arc<dyn WorkflowTrigger>,
        board: Arc<dyn NoticeSource>,
    ) -> Self {
        Self {
            store,
            commands,
            messenger,
            trigger,
            board,
            engine: NotificationEngine::default(),
        }
    }

    pub fn with_broadcaster(mut self, broadcaster: Broadcaster) -> Self {
        self.engine = NotificationEngine::new(broadcaster);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Poll commands, register subscribers, relay triggers, persist the
    /// cursor, then scrape and broadcast for `today`.
    pub async fn run(&mut self, today: NaiveDate) -> RunSummary {
        let mut summary = RunSummary::default();

        tracing::info!("--- Checking for new Telegram commands ---");
        let (cursor, names) = self.store.load_cursor();
        let mut registrar = Registrar::new(self.store.load_subscribers(), names);
        let poll = poll_commands(self.commands.as_ref(), cursor).await;
        summary.commands = poll.commands.len();
        summary.cursor = poll.cursor;

        let dispatcher = Dispatcher::new(self.messenger.as_ref(), self.trigger.as_ref());
        for command in &poll.commands {
            match command.kind() {
                CommandKind::Subscribe => {
                    registrar.handle(self.messenger.as_ref(), command).await;
                }
                CommandKind::Trigger => match dispatcher.handle(command).await {
                    TriggerOutcome::Fired => summary.triggers_fired += 1,
                    TriggerOutcome::Failed(_) => summary.triggers_failed += 1,
                },
                CommandKind::Unknown => {
                    tracing::debug!("Ignoring message from {}: {:?}", command.chat_id, command.text);
                }
            }
        }

        summary.store_errors = self.persist_registrations(&registrar, poll.cursor);
        summary.new_subscribers = registrar.added().to_vec();

        tracing::info!("--- Scraping notices ---");
        let notices = match self.board.fetch_notices().await {
            Ok(notices) => notices,
            Err(e) => {
                tracing::error!("❌ Error during scraping: {e}");
                Vec::new()
            }
        };

        summary.dedup = self
            .engine
            .process(&mut self.store, self.messenger.as_ref(), &notices, today)
            .await;
        summary.store_errors.extend(summary.dedup.store_errors.iter().cloned());

        tracing::info!("--- Run completed ---");
        summary
    }

    /// Command relay only: register `/start` senders, relay `scrape` to the
    /// workflow and report back whether the dispatch was accepted.
    ///
    /// Shares the cursor with [`Runner::run`], so every command it consumes
    /// is fully handled here. Already subscribed chats get the usage hint.
    pub async fn relay(&mut self) -> RelaySummary {
        let mut summary = RelaySummary::default();

        let (cursor, names) = self.store.load_cursor();
        let mut registrar = Registrar::new(self.store.load_subscribers(), names);
        let poll = poll_commands(self.commands.as_ref(), cursor).await;
        summary.commands = poll.commands.len();
        summary.cursor = poll.cursor;

        let dispatcher =
            Dispatcher::new(self.messenger.as_ref(), self.trigger.as_ref()).reporting_outcome();
        for command in &poll.commands {
            match command.kind() {
                CommandKind::Subscribe => {
                    if !registrar.handle(self.messenger.as_ref(), command).await {
                        dispatcher.send_usage(command).await;
                    }
                }
                CommandKind::Trigger => match dispatcher.handle(command).await {
                    TriggerOutcome::Fired => summary.triggers_fired += 1,
                    TriggerOutcome::Failed(_) => summary.triggers_failed += 1,
                },
                CommandKind::Unknown => {}
            }
        }

        summary.store_errors = self.persist_registrations(&registrar, poll.cursor);
        summary.new_subscribers = registrar.added().to_vec();
        summary
    }

    /// Save the subscriber set when it grew, then always the cursor and
    /// name map. Returns the store errors hit on the way.
    fn persist_registrations(&mut self, registrar: &Registrar, cursor: UpdateCursor) -> Vec<String> {
        let mut errors = Vec::new();
        if !registrar.added().is_empty() {
            match self.store.save_subscribers(registrar.subscribers()) {
                Ok(()) => tracing::info!(
                    "💾 Saved {} subscribers ({} new)",
                    registrar.subscribers().len(),
                    registrar.added().len()
                ),
                Err(e) => {
                    tracing::error!("❌ Failed to save subscribers: {e}");
                    errors.push(e.to_string());
                }
            }
        }
        if let Err(e) = self.store.save_cursor(cursor, registrar.names()) {
            tracing::error!("❌ Failed to save update cursor: {e}");
            errors.push(e.to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{ACK_TEXT, TRIGGER_OK_TEXT, USAGE_TEXT};
    use crate::testing::{FakeBoard, FakeTelegram, FakeTrigger, command, today};
    use noticebot_core::types::{ChatId, Notice};
    use noticebot_store::MemoryStore;
    use std::time::Duration;

    fn runner(
        store: MemoryStore,
        telegram: &Arc<FakeTelegram>,
        trigger: &Arc<FakeTrigger>,
        board: Option<Vec<Notice>>,
    ) -> Runner<MemoryStore> {
        Runner::new(
            store,
            telegram.clone(),
            telegram.clone(),
            trigger.clone(),
            Arc::new(FakeBoard(board)),
        )
        .with_broadcaster(Broadcaster::new(Duration::ZERO))
    }

    #[tokio::test]
    async fn test_scrape_command_acks_once_and_triggers_once_even_on_failure() {
        let store = MemoryStore::new().with_subscribers([ChatId::from(77)]);
        let telegram = Arc::new(FakeTelegram::with_commands(vec![command(5, 77, "scrape")]));
        let trigger = Arc::new(FakeTrigger::failing());

        let summary = runner(store, &telegram, &trigger, Some(vec![])).run(today()).await;

        assert_eq!(trigger.calls(), 1);
        assert_eq!(summary.triggers_failed, 1);
        let replies: Vec<String> = telegram
            .sent_to(77)
            .into_iter()
            .filter(|t| t == ACK_TEXT)
            .collect();
        assert_eq!(replies.len(), 1);
    }

    #[tokio::test]
    async fn test_full_run_registers_persists_and_broadcasts() {
        let store = MemoryStore::new()
            .with_subscribers([ChatId::from(1)])
            .with_cursor(UpdateCursor::new(2));
        let telegram = Arc::new(FakeTelegram::with_commands(vec![
            command(5, 2, "/start"),
            command(9, 3, "hello"),
            command(3, 2, "/start"),
            command(7, 2, "start"),
        ]));
        let trigger = Arc::new(FakeTrigger::default());
        let board = vec![Notice::new("Routine", "https://x.test/r.pdf", "October 22, 2025")];

        let mut runner = runner(store, &telegram, &trigger, Some(board));
        let summary = runner.run(today()).await;

        assert_eq!(summary.cursor.value(), 9);
        assert_eq!(summary.new_subscribers.len(), 1);
        assert_eq!(summary.dedup.new_today, 1);
        assert!(summary.store_errors.is_empty());

        let store = runner.store();
        let (cursor, names) = store.load_cursor();
        assert_eq!(cursor.value(), 9);
        assert_eq!(names[&ChatId::from(2)], "User2");
        assert_eq!(store.load_subscribers().len(), 2);
        assert_eq!(store.subscriber_saves(), 1);
        assert_eq!(store.notices().len(), 1);

        // The new subscriber is welcomed once, then gets the broadcast.
        let to_new = telegram.sent_to(2);
        assert_eq!(to_new.len(), 2);
        assert!(to_new[0].starts_with("👋 Welcome"));
        assert!(to_new[1].contains("1. Routine"));
        assert_eq!(trigger.calls(), 0);
    }

    #[tokio::test]
    async fn test_cursor_saved_even_without_new_subscribers() {
        let store = MemoryStore::new();
        let telegram = Arc::new(FakeTelegram::with_commands(vec![command(4, 1, "hi")]));
        let trigger = Arc::new(FakeTrigger::default());

        let mut runner = runner(store, &telegram, &trigger, Some(vec![]));
        runner.run(today()).await;

        assert_eq!(runner.store().cursor_saves(), 1);
        assert_eq!(runner.store().subscriber_saves(), 0);
        assert_eq!(runner.store().load_cursor().0.value(), 4);
    }

    #[tokio::test]
    async fn test_offline_poll_and_failed_scrape_still_broadcast_no_notice() {
        let store = MemoryStore::new()
            .with_subscribers([ChatId::from(1)])
            .with_cursor(UpdateCursor::new(12));
        let telegram = Arc::new(FakeTelegram::offline());
        let trigger = Arc::new(FakeTrigger::default());

        let mut runner = runner(store, &telegram, &trigger, None);
        let summary = runner.run(today()).await;

        assert_eq!(summary.cursor.value(), 12);
        assert_eq!(summary.dedup.scraped, 0);
        assert_eq!(
            telegram.sent_to(1),
            vec!["📅 Date: 2025-10-22\n\n📭 No Notice".to_string()]
        );
        assert!(runner.store().notices().is_empty());
    }

    #[tokio::test]
    async fn test_relay_registers_and_reports() {
        let store = MemoryStore::new().with_subscribers([ChatId::from(6)]);
        let telegram = Arc::new(FakeTelegram::with_commands(vec![
            command(1, 5, "/start"),
            command(2, 5, "/scrape"),
            command(3, 6, "/start"),
        ]));
        let trigger = Arc::new(FakeTrigger::default());

        let mut runner = runner(store, &telegram, &trigger, Some(vec![]));
        let summary = runner.relay().await;

        assert_eq!(summary.triggers_fired, 1);
        assert_eq!(summary.cursor.value(), 3);
        assert_eq!(summary.new_subscribers.len(), 1);

        let to_new = telegram.sent_to(5);
        assert_eq!(to_new.len(), 3);
        assert!(to_new[0].starts_with("👋 Welcome, User5!"));
        assert_eq!(to_new[1..], [ACK_TEXT.to_string(), TRIGGER_OK_TEXT.to_string()]);
        assert_eq!(telegram.sent_to(6), vec![USAGE_TEXT.to_string()]);

        let store = runner.store();
        assert!(store.load_subscribers().contains(&ChatId::from(5)));
        let (cursor, names) = store.load_cursor();
        assert_eq!(cursor.value(), 3);
        assert_eq!(names[&ChatId::from(5)], "User5");
    }

    #[tokio::test]
    async fn test_subscribe_seen_by_relay_survives_next_run() {
        let telegram = Arc::new(FakeTelegram::with_commands(vec![command(100, 55, "/start")]));
        let trigger = Arc::new(FakeTrigger::default());

        let mut relay = runner(MemoryStore::new(), &telegram, &trigger, Some(vec![]));
        relay.relay().await;

        // The next run starts from the cursor relay saved and sees nothing new.
        let later = Arc::new(FakeTelegram::with_commands(vec![]));
        let store = relay.store().clone();
        let mut run = runner(store, &later, &trigger, Some(vec![]));
        let summary = run.run(today()).await;

        assert_eq!(summary.cursor.value(), 100);
        assert!(summary.new_subscribers.is_empty());
        assert!(run.store().load_subscribers().contains(&ChatId::from(55)));
        assert_eq!(
            later.sent_to(55),
            vec!["📅 Date: 2025-10-22\n\n📭 No Notice".to_string()]
        );
    }
}
