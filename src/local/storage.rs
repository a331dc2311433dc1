//! JSON file storage for offline notebooks
//!
//! Directory structure:
//! ```text
//! {root}/
//! ├── notebooks.json        # Array of all notebooks
//! ├── items/
//! │   └── {notebook-id}.json # Items of one notebook, in insertion order
//! ├── review_states.json    # One state per (item type, item id)
//! └── review_logs.json      # Every recorded answer
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::remote::{self, ReviewLogSource, ReviewOutcomeGateway, SnapshotSource};
use crate::review::aggregator::notebook_counts;
use crate::review::algorithm::apply_outcome;
use crate::review::stats::MAX_STATS_DAYS;
use crate::review::models::*;

#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notebook not found: {0}")]
    NotebookNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Failed to get data directory")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, LocalStoreError>;

/// A notebook kept on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNotebook {
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_color() -> String {
    "#3B82F6".to_string()
}

impl LocalNotebook {
    pub fn new(name: String, color: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            color: color.unwrap_or_else(default_color),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn info(&self) -> NotebookInfo {
        NotebookInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            color: Some(self.color.clone()),
        }
    }
}

/// Storage manager for offline notebooks and their review data
pub struct LocalStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles on the JSON files
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            lock: Mutex::new(()),
        }
    }

    /// Default location under the user's local data directory
    pub fn default_root() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("notebook-review").join("local"))
            .ok_or(LocalStoreError::DataDirNotFound)
    }

    fn notebooks_path(&self) -> PathBuf {
        self.root.join("notebooks.json")
    }

    fn items_dir(&self) -> PathBuf {
        self.root.join("items")
    }

    fn items_path(&self, notebook_id: &str) -> PathBuf {
        self.items_dir().join(format!("{}.json", notebook_id))
    }

    fn states_path(&self) -> PathBuf {
        self.root.join("review_states.json")
    }

    fn logs_path(&self) -> PathBuf {
        self.root.join("review_logs.json")
    }

    /// Create the directory layout
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.items_dir())?;
        Ok(())
    }

    // ==================== Notebook Operations ====================

    /// List all notebooks in creation order
    pub fn list_notebooks(&self) -> Result<Vec<LocalNotebook>> {
        read_json_or_default(&self.notebooks_path())
    }

    pub fn get_notebook(&self, notebook_id: &str) -> Result<LocalNotebook> {
        self.list_notebooks()?
            .into_iter()
            .find(|n| n.id == notebook_id)
            .ok_or_else(|| LocalStoreError::NotebookNotFound(notebook_id.to_string()))
    }

    pub fn create_notebook(&self, name: String, color: Option<String>) -> Result<LocalNotebook> {
        let _guard = self.lock.lock().unwrap();
        self.init()?;

        let notebook = LocalNotebook::new(name, color);
        let mut notebooks = self.list_notebooks()?;
        notebooks.push(notebook.clone());
        write_json(&self.notebooks_path(), &notebooks)?;
        write_json(&self.items_path(&notebook.id), &Vec::<Item>::new())?;

        log::info!("Created notebook {} ({})", notebook.name, notebook.id);
        Ok(notebook)
    }

    /// Delete a notebook and its items. Review states stay, since the same
    /// word or sentence may live in other notebooks.
    pub fn delete_notebook(&self, notebook_id: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();

        let mut notebooks = self.list_notebooks()?;
        let before = notebooks.len();
        notebooks.retain(|n| n.id != notebook_id);
        if notebooks.len() == before {
            return Err(LocalStoreError::NotebookNotFound(notebook_id.to_string()));
        }
        write_json(&self.notebooks_path(), &notebooks)?;

        let items_path = self.items_path(notebook_id);
        if items_path.exists() {
            fs::remove_file(items_path)?;
        }
        Ok(())
    }

    // ==================== Item Operations ====================

    /// Items of a notebook in insertion order
    pub fn list_items(&self, notebook_id: &str) -> Result<Vec<Item>> {
        self.get_notebook(notebook_id)?;
        read_json_or_default(&self.items_path(notebook_id))
    }

    /// Append an item. Adding the same (type, id) twice keeps the first copy.
    pub fn add_item(&self, notebook_id: &str, item: Item) -> Result<Item> {
        let _guard = self.lock.lock().unwrap();

        let mut items = self.list_items(notebook_id)?;
        if let Some(existing) = items
            .iter()
            .find(|i| i.item_type() == item.item_type() && i.id() == item.id())
        {
            return Ok(existing.clone());
        }

        items.push(item.clone());
        write_json(&self.items_path(notebook_id), &items)?;
        self.touch_notebook(notebook_id)?;
        Ok(item)
    }

    pub fn remove_item(&self, notebook_id: &str, item_type: ItemType, item_id: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();

        let mut items = self.list_items(notebook_id)?;
        let before = items.len();
        items.retain(|i| !(i.item_type() == item_type && i.id() == item_id));
        if items.len() == before {
            return Err(LocalStoreError::ItemNotFound(item_id.to_string()));
        }
        write_json(&self.items_path(notebook_id), &items)?;
        self.touch_notebook(notebook_id)
    }

    fn touch_notebook(&self, notebook_id: &str) -> Result<()> {
        let mut notebooks = self.list_notebooks()?;
        if let Some(notebook) = notebooks.iter_mut().find(|n| n.id == notebook_id) {
            notebook.updated_at = Utc::now();
        }
        write_json(&self.notebooks_path(), &notebooks)
    }

    // ==================== Review Operations ====================

    pub fn review_states(&self) -> Result<Vec<ReviewState>> {
        read_json_or_default(&self.states_path())
    }

    /// Items and states of one notebook, read under the store lock
    pub fn snapshot(&self, notebook_id: &str, item_type: ItemType, now: DateTime<Utc>) -> Result<Snapshot> {
        let _guard = self.lock.lock().unwrap();

        let notebook = self.get_notebook(notebook_id)?;
        let items: Vec<Item> = self
            .list_items(notebook_id)?
            .into_iter()
            .filter(|i| i.item_type() == item_type)
            .collect();
        let states = self
            .review_states()?
            .into_iter()
            .filter(|s| s.item_type == item_type)
            .collect();

        Ok(Snapshot {
            notebook: notebook.info(),
            item_type,
            items,
            states,
            taken_at: now,
        })
    }

    /// Counts for every notebook, with due meaning strictly "state due by now"
    pub fn notebook_counts(&self, now: DateTime<Utc>) -> Result<Vec<NotebookCounts>> {
        let _guard = self.lock.lock().unwrap();

        let states = self.review_states()?;
        self.list_notebooks()?
            .iter()
            .map(|notebook| {
                let items: Vec<Item> = read_json_or_default(&self.items_path(&notebook.id))?;
                Ok(notebook_counts(&notebook.info(), &items, &states, now))
            })
            .collect()
    }

    /// Apply an answer to the stored state and append it to the log
    pub fn record_outcome(&self, outcome: &ReviewOutcome, now: DateTime<Utc>) -> Result<ReviewState> {
        let _guard = self.lock.lock().unwrap();
        self.init()?;

        let mut states = self.review_states()?;
        let position = states
            .iter()
            .position(|s| s.item_type == outcome.item_type && s.item_id == outcome.item_id);
        let updated = apply_outcome(
            position.map(|p| &states[p]),
            outcome.item_type,
            &outcome.item_id,
            outcome.is_known,
            now,
        );
        match position {
            Some(p) => states[p] = updated.clone(),
            None => states.push(updated.clone()),
        }
        write_json(&self.states_path(), &states)?;

        let mut logs: Vec<ReviewLogEntry> = read_json_or_default(&self.logs_path())?;
        logs.push(ReviewLogEntry {
            item_type: Some(outcome.item_type),
            item_id: Some(outcome.item_id.clone()),
            is_known: Some(outcome.is_known),
            created_at: now,
        });
        write_json(&self.logs_path(), &logs)?;

        log::debug!(
            "Recorded {} for {} {}, next review {:?}",
            if outcome.is_known { "known" } else { "unknown" },
            outcome.item_type,
            outcome.item_id,
            updated.next_review_at
        );
        Ok(updated)
    }

    /// Log entries created at or after `since`
    pub fn review_logs_since(&self, since: DateTime<Utc>) -> Result<Vec<ReviewLogEntry>> {
        let logs: Vec<ReviewLogEntry> = read_json_or_default(&self.logs_path())?;
        Ok(logs.into_iter().filter(|l| l.created_at >= since).collect())
    }
}

#[async_trait]
impl SnapshotSource for LocalStore {
    async fn notebooks(&self) -> remote::Result<Vec<NotebookCounts>> {
        Ok(self.notebook_counts(Utc::now())?)
    }

    async fn notebook_snapshot(&self, notebook_id: &str, item_type: ItemType) -> remote::Result<Snapshot> {
        Ok(self.snapshot(notebook_id, item_type, Utc::now())?)
    }
}

#[async_trait]
impl ReviewOutcomeGateway for LocalStore {
    async fn record(&self, outcome: &ReviewOutcome) -> remote::Result<Option<ReviewState>> {
        Ok(Some(self.record_outcome(outcome, Utc::now())?))
    }
}

#[async_trait]
impl ReviewLogSource for LocalStore {
    async fn review_logs(&self, days: u32) -> remote::Result<Vec<ReviewLogEntry>> {
        let days = days.min(MAX_STATS_DAYS);
        Ok(self.review_logs_since(Utc::now() - Duration::days(days as i64))?)
    }
}

/// Build a vocab item with a fresh id
pub fn new_vocab(word: String, translation: Option<String>) -> Item {
    Item::Vocab(VocabItem {
        id: Uuid::new_v4().to_string(),
        video_id: None,
        word,
        translation,
        phonetic: None,
        source_episode: None,
    })
}

/// Build a sentence item with a fresh id
pub fn new_sentence(text: String, translation: Option<String>) -> Item {
    Item::Sentence(SentenceItem {
        id: Uuid::new_v4().to_string(),
        video_id: None,
        text,
        translation,
        source_episode: None,
    })
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
