//! # NoticeBot Channels
//! Clients for the services a run talks to.
//!
//! - `telegram`: command polling and message delivery via the Bot API
//! - `github`: `workflow_dispatch` trigger for the scrape workflow
//! - `dry_run`: stand-ins that log instead of calling out

pub mod dry_run;
pub mod github;
pub mod telegram;

pub use dry_run::{LoggingMessenger, LoggingTrigger};
pub use github::GitHubWorkflow;
pub use telegram::TelegramChannel;
