//! File-based record store: the state a run leaves for the next one.
//!
//! Three files in one data directory:
//! - `scraped_notices.csv`: append-only log, header `Notice Title,URL,Date`
//! - `user_ids.json`: JSON array of subscriber chat ids
//! - `last_update_id.txt`: cursor on line 1, then `chat_id,name` lines
//!
//! Reads degrade to empty/default with a warning. Whole-file writes go to a
//! temporary sibling first and are renamed into place.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use noticebot_core::config::StoreConfig;
use noticebot_core::error::{NoticeBotError, Result};
use noticebot_core::traits::RecordStore;
use noticebot_core::types::{ChatId, Notice, UpdateCursor};
use url::Url;

const NOTICE_LOG_HEADER: [&str; 3] = ["Notice Title", "URL", "Date"];

/// Logged URLs are compared in the same serialized form the scraper
/// produces, so rows written by older deployments (raw spaces, bare host
/// without a trailing slash) still match.
fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Flat-file store.
pub struct FileStore {
    notices: PathBuf,
    subscribers: PathBuf,
    cursor: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir` using the default file names.
    pub fn new(dir: &Path) -> Self {
        Self::from_config_in(dir, &StoreConfig::default())
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::from_config_in(&config.data_dir(), config)
    }

    fn from_config_in(dir: &Path, config: &StoreConfig) -> Self {
        Self {
            notices: dir.join(&config.notices_file),
            subscribers: dir.join(&config.subscribers_file),
            cursor: dir.join(&config.cursor_file),
        }
    }

    pub fn notices_path(&self) -> &Path {
        &self.notices
    }

    fn read_optional(path: &Path) -> Option<String> {
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", path.display());
                None
            }
        }
    }

    /// Create the data directory on first write, never on read.
    fn ensure_parent(path: &Path) -> Result<()> {
        let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
            return Ok(());
        };
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("⚠️ Failed to create data dir {}: {e}", dir.display());
            return Err(e.into());
        }
        Ok(())
    }

    /// Replace `path` with `content` via a temporary sibling and rename.
    fn write_replace(path: &Path, content: &str) -> Result<()> {
        Self::ensure_parent(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NoticeBotError::Store(format!("Invalid path {}", path.display())))?;
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn load_known_urls(&self) -> BTreeSet<String> {
        let mut urls = BTreeSet::new();
        if !self.notices.exists() {
            return urls;
        }

        let mut reader = match csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.notices)
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("⚠️ Failed to open {}: {e}", self.notices.display());
                return urls;
            }
        };

        for record in reader.records() {
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping malformed notice row: {e}");
                    continue;
                }
            };
            if row.len() < 2 {
                continue;
            }
            let url = row[1].trim();
            if url.starts_with("http") {
                urls.insert(normalize_url(url));
            }
        }

        tracing::debug!("📊 Loaded {} known notice URLs", urls.len());
        urls
    }

    fn append_notice(&mut self, notice: &Notice) -> Result<()> {
        let needs_header = std::fs::metadata(&self.notices)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        Self::ensure_parent(&self.notices)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.notices)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let csv_err = |e: csv::Error| NoticeBotError::Store(format!("Notice log write: {e}"));
        if needs_header {
            writer.write_record(NOTICE_LOG_HEADER).map_err(csv_err)?;
        }
        writer
            .write_record([notice.title.as_str(), notice.url.as_str(), notice.date.as_str()])
            .map_err(csv_err)?;
        writer.flush()?;

        tracing::debug!("💾 Logged notice: {}", notice.url);
        Ok(())
    }

    fn load_subscribers(&self) -> BTreeSet<ChatId> {
        let Some(json) = Self::read_optional(&self.subscribers) else {
            return BTreeSet::new();
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&json) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("⚠️ Failed to parse {}: {e}", self.subscribers.display());
                return BTreeSet::new();
            }
        };

        values
            .into_iter()
            .filter_map(|value| match value {
                serde_json::Value::String(s) => Some(ChatId::new(s)),
                serde_json::Value::Number(n) => Some(ChatId::new(n.to_string())),
                other => {
                    tracing::warn!("⚠️ Ignoring subscriber entry {other}");
                    None
                }
            })
            .filter(|id| !id.is_empty())
            .collect()
    }

    fn save_subscribers(&mut self, subscribers: &BTreeSet<ChatId>) -> Result<()> {
        let ids: Vec<&str> = subscribers.iter().map(ChatId::as_str).collect();
        let json = serde_json::to_string_pretty(&ids)
            .map_err(|e| NoticeBotError::Store(format!("Serialize subscribers: {e}")))?;
        Self::write_replace(&self.subscribers, &json)?;
        tracing::debug!("💾 Saved {} subscribers to {}", ids.len(), self.subscribers.display());
        Ok(())
    }

    fn load_cursor(&self) -> (UpdateCursor, BTreeMap<ChatId, String>) {
        let Some(content) = Self::read_optional(&self.cursor) else {
            return (UpdateCursor::default(), BTreeMap::new());
        };

        let mut lines = content.lines();
        let cursor = match lines.next().map(|l| l.trim().parse::<i64>()) {
            Some(Ok(id)) => UpdateCursor::new(id),
            Some(Err(e)) => {
                tracing::warn!("⚠️ Corrupt cursor in {}: {e}", self.cursor.display());
                return (UpdateCursor::default(), BTreeMap::new());
            }
            None => return (UpdateCursor::default(), BTreeMap::new()),
        };

        let names = lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| line.split_once(','))
            .map(|(id, name)| (ChatId::new(id), name.to_string()))
            .filter(|(id, _)| !id.is_empty())
            .collect();

        (cursor, names)
    }

    fn save_cursor(
        &mut self,
        cursor: UpdateCursor,
        names: &BTreeMap<ChatId, String>,
    ) -> Result<()> {
        let mut content = format!("{cursor}\n");
        for (chat_id, name) in names {
            let name = name.replace(['\n', '\r'], " ");
            content.push_str(&format!("{chat_id},{name}\n"));
        }
        Self::write_replace(&self.cursor, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let (_dir, store) = store();
        assert!(store.load_known_urls().is_empty());
        assert!(store.load_subscribers().is_empty());
        let (cursor, names) = store.load_cursor();
        assert_eq!(cursor, UpdateCursor::default());
        assert!(names.is_empty());
    }

    #[test]
    fn test_append_and_load_notices() {
        let (_dir, mut store) = store();
        store
            .append_notice(&Notice::new(
                "Exam routine, \"Honours\" 4th year",
                "https://www.nu.ac.bd/uploads/a.pdf",
                "October 22, 2025",
            ))
            .unwrap();
        store
            .append_notice(&Notice::new("Result", "https://www.nu.ac.bd/b.pdf", "Oct 21, 2025"))
            .unwrap();

        let content = std::fs::read_to_string(store.notices_path()).unwrap();
        assert!(content.starts_with("Notice Title,URL,Date\n"));
        assert_eq!(content.matches("Notice Title").count(), 1);

        let urls = store.load_known_urls();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://www.nu.ac.bd/uploads/a.pdf"));
    }

    #[test]
    fn test_known_urls_skip_short_and_relative_rows() {
        let (_dir, store) = store();
        std::fs::write(
            store.notices_path(),
            "Notice Title,URL,Date\nonly-one-column\nRelative,/uploads/x.pdf,Oct 1, 2025\nGood,https://x.test/a,\"Oct 1, 2025\"\n",
        )
        .unwrap();

        let urls = store.load_known_urls();
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://x.test/a"));
    }

    #[test]
    fn test_known_urls_match_scraper_form() {
        let (_dir, store) = store();
        std::fs::write(
            store.notices_path(),
            "Notice Title,URL,Date\nRoutine,https://www.nu.ac.bd/uploads/exam routine.pdf,x\nHome,https://www.nu.ac.bd,x\n",
        )
        .unwrap();

        let urls = store.load_known_urls();
        assert!(urls.contains("https://www.nu.ac.bd/uploads/exam%20routine.pdf"));
        assert!(urls.contains("https://www.nu.ac.bd/"));
    }

    #[test]
    fn test_data_dir_created_on_first_write_only() {
        let root = tempfile::tempdir().unwrap();
        let data_dir = root.path().join("state").join("bot");
        let mut store = FileStore::new(&data_dir);

        assert!(store.load_known_urls().is_empty());
        assert!(store.load_subscribers().is_empty());
        assert!(!data_dir.exists());

        store.save_cursor(UpdateCursor::new(3), &BTreeMap::new()).unwrap();
        assert!(data_dir.exists());
        assert_eq!(store.load_cursor().0.value(), 3);
    }

    #[test]
    fn test_unwritable_data_dir_surfaces_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let mut store = FileStore::new(&blocker.join("data"));

        let err = store
            .append_notice(&Notice::new("A", "https://x.test/a", "Oct 1, 2025"))
            .unwrap_err();
        assert!(matches!(err, NoticeBotError::Io(_)));
    }

    #[test]
    fn test_subscribers_normalize_numbers_and_strings() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("user_ids.json"), r#"[12345, "12345", " 678 ", true]"#)
            .unwrap();

        let subs = store.load_subscribers();
        assert_eq!(subs.len(), 2);
        assert!(subs.contains(&ChatId::from(12345)));
        assert!(subs.contains(&ChatId::from(678)));
    }

    #[test]
    fn test_corrupt_subscribers_read_as_empty() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("user_ids.json"), "{not json").unwrap();
        assert!(store.load_subscribers().is_empty());
    }

    #[test]
    fn test_save_and_load_subscribers() {
        let (dir, mut store) = store();
        let subs: BTreeSet<ChatId> = [ChatId::from(1), ChatId::from(2)].into_iter().collect();
        store.save_subscribers(&subs).unwrap();

        assert_eq!(store.load_subscribers(), subs);
        assert!(!dir.path().join(".user_ids.json.tmp").exists());
    }

    #[test]
    fn test_cursor_round_trip_with_names() {
        let (_dir, mut store) = store();
        let mut names = BTreeMap::new();
        names.insert(ChatId::from(42), "Rahim, Jr.".to_string());
        names.insert(ChatId::from(7), "Karim".to_string());

        store.save_cursor(UpdateCursor::new(9), &names).unwrap();
        let (cursor, loaded) = store.load_cursor();
        assert_eq!(cursor.value(), 9);
        assert_eq!(loaded, names);
    }

    #[test]
    fn test_corrupt_cursor_reads_as_default() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("last_update_id.txt"), "abc\n1,Name\n").unwrap();
        let (cursor, names) = store.load_cursor();
        assert_eq!(cursor.value(), 0);
        assert!(names.is_empty());
    }
}
