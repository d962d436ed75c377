//! # NoticeBot Core
//!
//! Shared vocabulary for every NoticeBot crate: the domain types that cross
//! crate boundaries, the traits each collaborator implements, the
//! configuration model, and the error taxonomy.
//!
//! ```text
//! CommandSource ──► poller ──► registrar / dispatcher ──► Messenger, WorkflowTrigger
//! NoticeSource  ──► dedup  ──► broadcast ──► Messenger
//!                     │
//!                     └──► RecordStore (flat files between runs)
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::NoticeBotConfig;
pub use error::{NoticeBotError, Result};
pub use traits::{CommandSource, Messenger, NoticeSource, RecordStore, WorkflowTrigger};
pub use types::{
    ChatId, CommandKind, InboundCommand, Notice, OutgoingMessage, Subscriber, UpdateBatch,
    UpdateCursor,
};
