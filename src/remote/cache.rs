//! Write-through cache of review states in front of a snapshot source
//!
//! The snapshot is always the source of truth. A fresh snapshot for a
//! (user, item type) key replaces everything cached for that key; a
//! recorded outcome that echoes its new state overwrites that one entry.
//! Entries are never merged field by field.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Result, ReviewOutcomeGateway, SnapshotSource};
use crate::review::models::{ItemType, NotebookCounts, ReviewOutcome, ReviewState, Snapshot};

type CacheKey = (String, ItemType);

/// Review states last seen, keyed by (user, item type) then item id
#[derive(Debug, Default)]
pub struct ReviewStateCache {
    entries: Mutex<HashMap<CacheKey, HashMap<String, ReviewState>>>,
}

impl ReviewStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything cached for (user, item type) with `states`
    pub fn replace(&self, user_id: &str, item_type: ItemType, states: &[ReviewState]) {
        let mut fresh = HashMap::with_capacity(states.len());
        for state in states.iter().filter(|s| s.item_type == item_type) {
            fresh.entry(state.item_id.clone()).or_insert_with(|| state.clone());
        }
        self.entries
            .lock()
            .unwrap()
            .insert((user_id.to_string(), item_type), fresh);
    }

    /// Overwrite a single entry after a recorded outcome
    pub fn write(&self, user_id: &str, state: ReviewState) {
        self.entries
            .lock()
            .unwrap()
            .entry((user_id.to_string(), state.item_type))
            .or_default()
            .insert(state.item_id.clone(), state);
    }

    pub fn get(&self, user_id: &str, item_type: ItemType, item_id: &str) -> Option<ReviewState> {
        self.entries
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), item_type))
            .and_then(|states| states.get(item_id).cloned())
    }

    pub fn invalidate(&self, user_id: &str, item_type: ItemType) {
        self.entries
            .lock()
            .unwrap()
            .remove(&(user_id.to_string(), item_type));
    }
}

/// Wraps a backend so snapshots and recorded outcomes keep a cache current
pub struct CachingSource<B> {
    backend: Arc<B>,
    cache: Arc<ReviewStateCache>,
    user_id: String,
}

impl<B> CachingSource<B> {
    pub fn new(backend: Arc<B>, cache: Arc<ReviewStateCache>, user_id: impl Into<String>) -> Self {
        Self {
            backend,
            cache,
            user_id: user_id.into(),
        }
    }

    pub fn cache(&self) -> &Arc<ReviewStateCache> {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

#[async_trait]
impl<B: SnapshotSource> SnapshotSource for CachingSource<B> {
    async fn notebooks(&self) -> Result<Vec<NotebookCounts>> {
        self.backend.notebooks().await
    }

    async fn notebook_snapshot(&self, notebook_id: &str, item_type: ItemType) -> Result<Snapshot> {
        let snapshot = self.backend.notebook_snapshot(notebook_id, item_type).await?;
        self.cache.replace(&self.user_id, item_type, &snapshot.states);
        Ok(snapshot)
    }
}

#[async_trait]
impl<B: ReviewOutcomeGateway> ReviewOutcomeGateway for CachingSource<B> {
    async fn record(&self, outcome: &ReviewOutcome) -> Result<Option<ReviewState>> {
        let updated = self.backend.record(outcome).await?;
        if let Some(state) = &updated {
            self.cache.write(&self.user_id, state.clone());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn state(id: &str, level: f64) -> ReviewState {
        let mut state = ReviewState::new(ItemType::Vocab, id);
        state.familiarity_level = Some(level);
        state
    }

    #[test]
    fn test_replace_is_wholesale() {
        let cache = ReviewStateCache::new();
        cache.replace("u1", ItemType::Vocab, &[state("a", 1.0), state("b", 2.0)]);
        cache.replace("u1", ItemType::Vocab, &[state("b", 4.0)]);

        assert_eq!(cache.get("u1", ItemType::Vocab, "a"), None);
        assert_eq!(
            cache.get("u1", ItemType::Vocab, "b").and_then(|s| s.familiarity_level),
            Some(4.0)
        );
    }

    #[test]
    fn test_write_overwrites_whole_entry() {
        let cache = ReviewStateCache::new();
        let mut old = state("a", 3.0);
        old.next_review_at = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        cache.replace("u1", ItemType::Vocab, &[old]);

        cache.write("u1", state("a", 0.0));

        let cached = cache.get("u1", ItemType::Vocab, "a").unwrap();
        assert_eq!(cached.familiarity_level, Some(0.0));
        assert_eq!(cached.next_review_at, None);
    }

    #[test]
    fn test_keys_are_per_user_and_type() {
        let cache = ReviewStateCache::new();
        cache.replace("u1", ItemType::Vocab, &[state("a", 1.0)]);
        cache.replace("u1", ItemType::Sentence, &[]);

        assert!(cache.get("u2", ItemType::Vocab, "a").is_none());
        assert!(cache.get("u1", ItemType::Vocab, "a").is_some());

        cache.invalidate("u1", ItemType::Vocab);
        assert!(cache.get("u1", ItemType::Vocab, "a").is_none());
    }
}
