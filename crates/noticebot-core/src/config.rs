//! NoticeBot configuration system.
//!
//! Layering: TOML file (optional) → environment variables → `validate()`.
//! Secrets are expected to come from the environment (CI secrets), the file
//! is for tunables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NoticeBotError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeBotConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl NoticeBotConfig {
    /// Load from `path`, or from `./noticebot.toml` if it exists, or defaults.
    /// Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load_from(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NoticeBotError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| NoticeBotError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("noticebot.toml")
    }

    /// Overlay values from the environment. `lookup` is `std::env::var` in
    /// production; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("GITHUB_TOKEN").or_else(|| get("TOKE_GITHUB_BOT")) {
            self.github.token = v;
        }
        if let Some(v) = get("GITHUB_OWNER") {
            self.github.owner = v;
        }
        if let Some(v) = get("GITHUB_REPO") {
            self.github.repo = v;
        }
        if let Some(v) = get("GITHUB_WORKFLOW") {
            self.github.workflow = v;
        }
        if let Some(v) = get("GITHUB_REF") {
            self.github.git_ref = v;
        }
        if let Some(v) = get("NOTICE_BASE_URL") {
            self.scraper.base_url = v;
        }
        if let Some(v) = get("NOTICEBOT_DATA_DIR") {
            self.store.data_dir = v;
        }
    }

    /// Fail fast when a required credential or identifier is missing.
    /// The error names every missing environment variable at once.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("TELEGRAM_BOT_TOKEN", &self.telegram.bot_token),
            ("GITHUB_TOKEN", &self.github.token),
            ("GITHUB_OWNER", &self.github.owner),
            ("GITHUB_REPO", &self.github.repo),
            ("GITHUB_WORKFLOW", &self.github.workflow),
            ("NOTICE_BASE_URL", &self.scraper.base_url),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(NoticeBotError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }
        if self.telegram.send_delay_ms > 60_000 {
            return Err(NoticeBotError::Config(
                "telegram.send_delay_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Timeout for `sendMessage` calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Pause between broadcast messages.
    #[serde(default = "default_send_delay")]
    pub send_delay_ms: u64,
}

fn default_telegram_api_base() -> String { "https://api.telegram.org".into() }
fn default_poll_timeout() -> u64 { 10 }
fn default_request_timeout() -> u64 { 15 }
fn default_send_delay() -> u64 { 1000 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_telegram_api_base(),
            poll_timeout_secs: default_poll_timeout(),
            request_timeout_secs: default_request_timeout(),
            send_delay_ms: default_send_delay(),
        }
    }
}

/// GitHub Actions `workflow_dispatch` target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    /// Workflow file name or id, e.g. `main.yml`.
    #[serde(default)]
    pub workflow: String,
    #[serde(default = "default_git_ref", rename = "ref")]
    pub git_ref: String,
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_git_ref() -> String { "main".into() }
fn default_github_api_base() -> String { "https://api.github.com".into() }

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            workflow: String::new(),
            git_ref: default_git_ref(),
            api_base: default_github_api_base(),
            timeout_secs: default_request_timeout(),
        }
    }
}

/// Notice-board page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_row_selector")]
    pub row_selector: String,
    /// The board can take minutes to respond; keep this generous.
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_rows() -> usize { 20 }
fn default_row_selector() -> String { "table tbody tr".into() }
fn default_page_timeout() -> u64 { 600 }
fn default_user_agent() -> String { format!("NoticeBot/{}", env!("CARGO_PKG_VERSION")) }

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_rows: default_max_rows(),
            row_selector: default_row_selector(),
            page_timeout_secs: default_page_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Flat-file store locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_notices_file")]
    pub notices_file: String,
    #[serde(default = "default_subscribers_file")]
    pub subscribers_file: String,
    #[serde(default = "default_cursor_file")]
    pub cursor_file: String,
}

fn default_data_dir() -> String { ".".into() }
fn default_notices_file() -> String { "scraped_notices.csv".into() }
fn default_subscribers_file() -> String { "user_ids.json".into() }
fn default_cursor_file() -> String { "last_update_id.txt".into() }

impl StoreConfig {
    /// Data directory with `~` expanded.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).to_string())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            notices_file: default_notices_file(),
            subscribers_file: default_subscribers_file(),
            cursor_file: default_cursor_file(),
        }
    }
}
