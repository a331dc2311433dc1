//! Persistence of in-progress review sessions across reloads
//!
//! One record per session key, written after every answer and read back
//! once when a session is rebuilt. A record is honored only while it
//! matches the recomposed session and is younger than
//! [`PROGRESS_VALIDITY_MINUTES`].
//!
//! Two open sessions on the same key are not coordinated: the last save
//! wins.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::{ItemType, SessionStats};

/// Age at which a saved record stops being restorable
pub const PROGRESS_VALIDITY_MINUTES: i64 = 120;

#[derive(Error, Debug)]
pub enum ProgressStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProgressStoreError>;

/// Scope of one persisted session: user, notebook and item type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub notebook_id: String,
    pub item_type: ItemType,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, notebook_id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            user_id: user_id.into(),
            notebook_id: notebook_id.into(),
            item_type,
        }
    }

    /// Storage key, safe to use as a file name
    pub fn storage_key(&self) -> String {
        format!(
            "review_progress_{}_{}_{}",
            sanitize(&self.user_id),
            sanitize(&self.notebook_id),
            self.item_type
        )
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.user_id, self.notebook_id, self.item_type)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Get/set/delete storage scoped to the current user
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Record written for an in-progress session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Sanitized keys can collide, so the owner is stored in full
    #[serde(default)]
    pub user_id: String,
    pub notebook_id: String,
    pub index: usize,
    pub stats: SessionStats,
    pub total: usize,
    pub saved_at: DateTime<Utc>,
}

/// Position and tally recovered from a valid record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub index: usize,
    pub stats: SessionStats,
}

/// Saves and restores session position on top of a [`KeyValueStore`].
/// Storage failures are logged and never surface to the caller.
pub struct SessionProgressStore {
    store: Box<dyn KeyValueStore>,
}

impl SessionProgressStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Persist the current position of a session
    pub fn save(
        &self,
        key: &SessionKey,
        index: usize,
        stats: SessionStats,
        total: usize,
        now: DateTime<Utc>,
    ) {
        let record = ProgressRecord {
            user_id: key.user_id.clone(),
            notebook_id: key.notebook_id.clone(),
            index,
            stats,
            total,
            saved_at: now,
        };

        let result = serde_json::to_string(&record)
            .map_err(ProgressStoreError::from)
            .and_then(|json| self.store.set(&key.storage_key(), &json));
        if let Err(e) = result {
            log::warn!("Failed to save review progress for {}: {}", key, e);
        }
    }

    /// Read back the record for `key` if it still describes this session.
    /// Any record that fails a check is deleted.
    pub fn restore(&self, key: &SessionKey, total: usize, now: DateTime<Utc>) -> Option<SessionProgress> {
        let storage_key = key.storage_key();
        let raw = match self.store.get(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read review progress for {}: {}", key, e);
                return None;
            }
        };

        let record: ProgressRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Discarding corrupt review progress for {}: {}", key, e);
                self.discard(key);
                return None;
            }
        };

        if let Some(reason) = rejection_reason(&record, key, total, now) {
            log::info!("Discarding review progress for {}: {}", key, reason);
            self.discard(key);
            return None;
        }

        Some(SessionProgress {
            index: record.index,
            stats: record.stats,
        })
    }

    /// Remove the record for `key`
    pub fn clear(&self, key: &SessionKey) {
        self.discard(key);
    }

    fn discard(&self, key: &SessionKey) {
        if let Err(e) = self.store.remove(&key.storage_key()) {
            log::warn!("Failed to remove review progress for {}: {}", key, e);
        }
    }
}

fn rejection_reason(
    record: &ProgressRecord,
    key: &SessionKey,
    total: usize,
    now: DateTime<Utc>,
) -> Option<String> {
    if record.user_id != key.user_id {
        return Some(format!("saved for user {:?}", record.user_id));
    }
    if record.notebook_id != key.notebook_id {
        return Some(format!("saved for notebook {}", record.notebook_id));
    }
    if record.total != total {
        return Some(format!("saved with {} items, session has {}", record.total, total));
    }
    if record.index > record.total {
        return Some(format!("index {} past end of {} items", record.index, record.total));
    }
    if now - record.saved_at >= Duration::minutes(PROGRESS_VALIDITY_MINUTES) {
        return Some(format!("saved at {}", record.saved_at.to_rfc3339()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 19, 30, 0).unwrap()
    }

    fn key() -> SessionKey {
        SessionKey::new("user-1", "kitchen", ItemType::Vocab)
    }

    fn stats(known: u32, unknown: u32) -> SessionStats {
        SessionStats { known, unknown }
    }

    #[test]
    fn test_save_then_restore() {
        let store = SessionProgressStore::in_memory();
        store.save(&key(), 7, stats(5, 2), 20, now());

        let restored = store.restore(&key(), 20, now() + Duration::minutes(10));
        assert_eq!(
            restored,
            Some(SessionProgress {
                index: 7,
                stats: stats(5, 2)
            })
        );
    }

    #[test]
    fn test_stale_record_is_discarded() {
        let store = SessionProgressStore::in_memory();
        store.save(&key(), 7, stats(5, 2), 20, now());

        assert_eq!(store.restore(&key(), 20, now() + Duration::hours(3)), None);
        // Deleted, so even a timely read finds nothing now
        assert_eq!(store.restore(&key(), 20, now()), None);
    }

    #[test]
    fn test_exact_validity_boundary_is_stale() {
        let store = SessionProgressStore::in_memory();
        store.save(&key(), 1, stats(1, 0), 20, now());
        assert_eq!(store.restore(&key(), 20, now() + Duration::hours(2)), None);
    }

    #[test]
    fn test_total_mismatch_is_discarded() {
        let store = SessionProgressStore::in_memory();
        store.save(&key(), 3, stats(2, 1), 20, now());

        assert_eq!(store.restore(&key(), 18, now()), None);
        assert_eq!(store.restore(&key(), 20, now()), None);
    }

    #[test]
    fn test_notebook_mismatch_is_discarded() {
        let memory = Arc::new(MemoryStore::new());
        let foreign = ProgressRecord {
            user_id: "user-1".to_string(),
            notebook_id: "garden".to_string(),
            index: 2,
            stats: stats(2, 0),
            total: 20,
            saved_at: now(),
        };
        memory
            .set(&key().storage_key(), &serde_json::to_string(&foreign).unwrap())
            .unwrap();
        let store = SessionProgressStore::new(Box::new(Arc::clone(&memory)));

        assert_eq!(store.restore(&key(), 20, now()), None);
        assert_eq!(memory.get(&key().storage_key()).unwrap(), None);
    }

    #[test]
    fn test_corrupt_record_is_discarded() {
        let memory = Arc::new(MemoryStore::new());
        memory.set(&key().storage_key(), "{not json").unwrap();
        let store = SessionProgressStore::new(Box::new(Arc::clone(&memory)));

        assert_eq!(store.restore(&key(), 20, now()), None);
        assert_eq!(memory.get(&key().storage_key()).unwrap(), None);
    }

    #[test]
    fn test_stale_and_mismatched_records_are_deleted() {
        let memory = Arc::new(MemoryStore::new());
        let store = SessionProgressStore::new(Box::new(Arc::clone(&memory)));

        store.save(&key(), 3, stats(3, 0), 20, now());
        assert_eq!(store.restore(&key(), 20, now() + Duration::hours(3)), None);
        assert_eq!(memory.get(&key().storage_key()).unwrap(), None);

        store.save(&key(), 3, stats(3, 0), 20, now());
        assert_eq!(store.restore(&key(), 19, now()), None);
        assert_eq!(memory.get(&key().storage_key()).unwrap(), None);
    }

    #[test]
    fn test_colliding_user_ids_do_not_share_progress() {
        let store = SessionProgressStore::in_memory();
        let slash = SessionKey::new("a/b", "kitchen", ItemType::Vocab);
        let underscore = SessionKey::new("a_b", "kitchen", ItemType::Vocab);
        assert_eq!(slash.storage_key(), underscore.storage_key());

        store.save(&slash, 5, stats(5, 0), 20, now());
        assert_eq!(store.restore(&underscore, 20, now()), None);
        assert_eq!(store.restore(&slash, 20, now()), None);
    }

    #[test]
    fn test_clear_removes_record() {
        let store = SessionProgressStore::in_memory();
        store.save(&key(), 4, stats(4, 0), 20, now());
        store.clear(&key());
        assert_eq!(store.restore(&key(), 20, now()), None);
    }

    #[test]
    fn test_keys_are_scoped_per_user_and_type() {
        let store = SessionProgressStore::in_memory();
        store.save(&key(), 4, stats(4, 0), 20, now());

        let other_user = SessionKey::new("user-2", "kitchen", ItemType::Vocab);
        let other_type = SessionKey::new("user-1", "kitchen", ItemType::Sentence);
        assert_eq!(store.restore(&other_user, 20, now()), None);
        assert_eq!(store.restore(&other_type, 20, now()), None);
        assert!(store.restore(&key(), 20, now()).is_some());
    }

    #[test]
    fn test_last_save_wins() {
        let store = SessionProgressStore::in_memory();
        store.save(&key(), 9, stats(9, 0), 20, now());
        store.save(&key(), 2, stats(1, 1), 20, now());

        assert_eq!(store.restore(&key(), 20, now()).map(|p| p.index), Some(2));
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = SessionProgressStore::new(Box::new(
            FileStore::new(temp.path().join("progress")).unwrap(),
        ));
        store.save(&key(), 7, stats(5, 2), 20, now());

        let reopened = SessionProgressStore::new(Box::new(
            FileStore::new(temp.path().join("progress")).unwrap(),
        ));
        assert_eq!(
            reopened.restore(&key(), 20, now() + Duration::minutes(5)).map(|p| p.index),
            Some(7)
        );
    }

    #[test]
    fn test_storage_key_is_file_safe() {
        let key = SessionKey::new("a/b", "c d", ItemType::Sentence);
        assert_eq!(key.storage_key(), "review_progress_a_b_c_d_sentence");
    }
}
