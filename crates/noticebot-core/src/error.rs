//! Error types for NoticeBot.

/// Every failure a NoticeBot run can observe.
///
/// Only `Config` is fatal. Everything else is caught where it happens,
/// logged, and turned into "no data" or "not sent" for that step.
#[derive(Debug, thiserror::Error)]
pub enum NoticeBotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Workflow trigger rejected with status {status}: {body}")]
    Trigger { status: u16, body: String },

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NoticeBotError {
    /// Short status label used when reporting a trigger outcome back to a chat.
    pub fn status_label(&self) -> String {
        match self {
            Self::Trigger { status, .. } => status.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NoticeBotError>;
