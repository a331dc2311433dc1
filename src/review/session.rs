//! A running review session: cursor, tally and progress persistence

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::composer::SessionPlan;
use super::models::{Item, ItemType, ReviewOutcome, SessionStats};
use super::progress::{SessionKey, SessionProgressStore};
use crate::remote::ReviewOutcomeGateway;

/// What happened when an answer was applied
#[derive(Debug)]
pub struct AnswerReceipt {
    pub item: Item,
    pub is_known: bool,
    /// Cursor position after the answer
    pub index: usize,
    pub completed: bool,
    /// Background write of the outcome; `None` when no runtime was available
    pub recording: Option<JoinHandle<()>>,
}

/// One pass through a composed plan.
///
/// Progress is restored once, when the session is started. Every answer
/// saves the new position; finishing or restarting clears it. Dropping the
/// session leaves the saved position for the next start.
pub struct ReviewSession {
    key: SessionKey,
    items: Vec<Item>,
    current_index: usize,
    stats: SessionStats,
    restored: bool,
    progress: Arc<SessionProgressStore>,
    gateway: Arc<dyn ReviewOutcomeGateway>,
}

impl ReviewSession {
    pub fn start(
        key: SessionKey,
        plan: SessionPlan,
        progress: Arc<SessionProgressStore>,
        gateway: Arc<dyn ReviewOutcomeGateway>,
        now: DateTime<Utc>,
    ) -> Self {
        let items = plan.items;
        let mut session = Self {
            key,
            items,
            current_index: 0,
            stats: SessionStats::default(),
            restored: false,
            progress,
            gateway,
        };

        if let Some(saved) = session.progress.restore(&session.key, session.items.len(), now) {
            log::info!(
                "Resuming review {} at {}/{}",
                session.key,
                saved.index,
                session.items.len()
            );
            session.current_index = saved.index;
            session.stats = saved.stats;
            session.restored = true;
        }

        session
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn item_type(&self) -> ItemType {
        self.key.item_type
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Whether saved progress was picked up when the session started
    pub fn was_restored(&self) -> bool {
        self.restored
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.items.len()
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.current_index
    }

    pub fn current(&self) -> Option<&Item> {
        self.items.get(self.current_index)
    }

    /// Apply the answer for the current item and move on.
    ///
    /// The outcome is sent to the gateway in the background after the
    /// cursor has moved; a failed write is logged and nothing is rolled back.
    /// Returns `None` once the session is complete.
    pub fn answer(&mut self, is_known: bool, now: DateTime<Utc>) -> Option<AnswerReceipt> {
        let item = self.current()?.clone();

        if is_known {
            self.stats.known += 1;
        } else {
            self.stats.unknown += 1;
        }
        self.current_index += 1;

        let completed = self.is_complete();
        if completed {
            self.progress.clear(&self.key);
        } else {
            self.progress
                .save(&self.key, self.current_index, self.stats, self.items.len(), now);
        }

        let outcome = ReviewOutcome {
            item_type: item.item_type(),
            item_id: item.id().to_string(),
            is_known,
            video_id: item.video_id().map(str::to_string),
            notebook_id: self.key.notebook_id.clone(),
            review_mode: self.key.item_type.review_mode().to_string(),
        };
        let recording = self.send_outcome(outcome);

        Some(AnswerReceipt {
            item,
            is_known,
            index: self.current_index,
            completed,
            recording,
        })
    }

    /// Start over from the first item with a clean tally
    pub fn restart(&mut self) {
        self.progress.clear(&self.key);
        self.current_index = 0;
        self.stats = SessionStats::default();
        self.restored = false;
    }

    fn send_outcome(&self, outcome: ReviewOutcome) -> Option<JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!(
                    "No async runtime, outcome for {} {} not recorded",
                    outcome.item_type,
                    outcome.item_id
                );
                return None;
            }
        };

        let gateway = Arc::clone(&self.gateway);
        Some(handle.spawn(async move {
            if let Err(e) = gateway.record(&outcome).await {
                log::warn!(
                    "Failed to record outcome for {} {}: {}",
                    outcome.item_type,
                    outcome.item_id,
                    e
                );
            }
        }))
    }
}
