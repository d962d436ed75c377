//! Notice deduplication and the daily broadcast.
//!
//! The notice log is the only memory between runs: a URL in the log has
//! been handled and is never announced again. Only notices dated today are
//! announced; everything else scraped is logged silently so the log keeps
//! up with the board.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use noticebot_core::traits::{Messenger, RecordStore};
use noticebot_core::types::Notice;
use noticebot_scraper::parse_notice_date;

use crate::broadcast::{BroadcastReport, Broadcaster};

/// What one pass over the scraped notices did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub scraped: usize,
    pub new_today: usize,
    pub persisted: usize,
    pub broadcast: BroadcastReport,
    pub store_errors: Vec<String>,
}

/// Group notices by parsed date. Unparseable dates are left out.
pub fn group_by_date(notices: &[Notice]) -> BTreeMap<NaiveDate, Vec<&Notice>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&Notice>> = BTreeMap::new();
    for notice in notices {
        match parse_notice_date(&notice.date) {
            Some(date) => groups.entry(date).or_default().push(notice),
            None => tracing::warn!("⚠️ Could not parse date {:?} for {}", notice.date, notice.url),
        }
    }
    groups
}

/// Notices whose URL is neither in `seen` nor repeated earlier in the batch.
pub fn select_new<'a>(candidates: &[&'a Notice], seen: &BTreeSet<String>) -> Vec<&'a Notice> {
    let mut batch = BTreeSet::new();
    candidates
        .iter()
        .copied()
        .filter(|n| !seen.contains(&n.url) && batch.insert(n.url.clone()))
        .collect()
}

pub fn new_notices_message(today: NaiveDate, notices: &[&Notice]) -> String {
    let mut message = format!("📅 Date: {}\n\n🔔 New Notices Found\n\n", today.format("%Y-%m-%d"));
    for (i, notice) in notices.iter().enumerate() {
        message.push_str(&format!(
            "{}. {}\n   View Notice: {}\n\n",
            i + 1,
            notice.title,
            notice.url
        ));
    }
    message
}

pub fn no_notice_message(today: NaiveDate) -> String {
    format!("📅 Date: {}\n\n📭 No Notice", today.format("%Y-%m-%d"))
}

/// Filters scraped notices against the log, broadcasts, and persists.
#[derive(Debug, Clone, Default)]
pub struct NotificationEngine {
    broadcaster: Broadcaster,
}

impl NotificationEngine {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self { broadcaster }
    }

    pub async fn process(
        &self,
        store: &mut dyn RecordStore,
        messenger: &dyn Messenger,
        notices: &[Notice],
        today: NaiveDate,
    ) -> DedupReport {
        let mut report = DedupReport {
            scraped: notices.len(),
            ..DedupReport::default()
        };
        let subscribers = store.load_subscribers();

        if notices.is_empty() {
            tracing::info!("📭 No notices found");
            report.broadcast = self
                .broadcaster
                .broadcast(messenger, &subscribers, &no_notice_message(today))
                .await;
            return report;
        }

        let mut seen = store.load_known_urls();
        tracing::info!("🔎 Already logged: {} notices", seen.len());

        let groups = group_by_date(notices);
        let fresh = groups
            .get(&today)
            .map(|todays| select_new(todays, &seen))
            .unwrap_or_default();
        report.new_today = fresh.len();

        if fresh.is_empty() {
            tracing::info!("✅ No new notices for {today}");
            report.broadcast = self
                .broadcaster
                .broadcast(messenger, &subscribers, &no_notice_message(today))
                .await;
        } else {
            tracing::info!("🔔 Sending {} new notices for {today}", fresh.len());
            report.broadcast = self
                .broadcaster
                .broadcast(messenger, &subscribers, &new_notices_message(today, &fresh))
                .await;
            for notice in &fresh {
                persist(store, &mut seen, &mut report, notice);
            }
        }

        // Older and undated notices are logged without being announced.
        for notice in notices {
            if !seen.contains(&notice.url) {
                persist(store, &mut seen, &mut report, notice);
            }
        }

        report
    }
}

/// Append once per URL per run; a failed append is not retried.
fn persist(
    store: &mut dyn RecordStore,
    seen: &mut BTreeSet<String>,
    report: &mut DedupReport,
    notice: &Notice,
) {
    seen.insert(notice.url.clone());
    match store.append_notice(notice) {
        Ok(()) => report.persisted += 1,
        Err(e) => {
            tracing::error!("❌ Failed to log notice {}: {e}", notice.url);
            report.store_errors.push(e.to_string());
        }
    }
}
