//! # NoticeBot Engine
//!
//! One invocation of the bot, start to finish. Nothing survives the process
//! except what is written to the `RecordStore`.
//!
//! ```text
//! Runner::run
//!   ├── poller      cursor ──► getUpdates ──► commands, advanced cursor
//!   ├── registrar   /start  ──► subscriber set + welcome reply
//!   ├── dispatcher  scrape  ──► acknowledgement + workflow dispatch
//!   ├── store       subscribers (if changed), cursor (always)
//!   └── dedup       scraped notices ──► today's new ──► broadcast ──► notice log
//! ```

pub mod broadcast;
pub mod dedup;
pub mod dispatcher;
pub mod poller;
pub mod registrar;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use dedup::{DedupReport, NotificationEngine};
pub use dispatcher::{Dispatcher, TriggerOutcome};
pub use poller::{PollOutcome, poll_commands};
pub use registrar::Registrar;
pub use runner::{RelaySummary, RunSummary, Runner};
