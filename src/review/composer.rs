//! Composition of a bounded, ordered review session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::classify;
use super::models::{Item, ItemType, ReviewState};

/// Maximum number of items per session, by item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCaps {
    #[serde(default = "default_vocab_cap")]
    pub vocab_cap: usize,
    #[serde(default = "default_sentence_cap")]
    pub sentence_cap: usize,
}

fn default_vocab_cap() -> usize {
    20
}

fn default_sentence_cap() -> usize {
    50
}

impl Default for SessionCaps {
    fn default() -> Self {
        Self {
            vocab_cap: default_vocab_cap(),
            sentence_cap: default_sentence_cap(),
        }
    }
}

impl SessionCaps {
    pub fn for_type(&self, item_type: ItemType) -> usize {
        match item_type {
            ItemType::Vocab => self.vocab_cap,
            ItemType::Sentence => self.sentence_cap,
        }
    }
}

/// Items selected for one session, in review order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    pub items: Vec<Item>,
    /// Due items in the whole collection, not only the selected ones
    pub due_count: usize,
    pub fresh_count: usize,
    pub future_count: usize,
}

impl SessionPlan {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_count(&self) -> usize {
        self.due_count + self.fresh_count + self.future_count
    }
}

/// Outcome of composing a session. An empty collection and a collection
/// with nothing to review are reported differently.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Composition {
    /// The collection holds no items of this type
    Empty,
    /// Every item is scheduled for later
    NothingDue {
        total: usize,
        next_due_at: Option<DateTime<Utc>>,
    },
    Ready(SessionPlan),
}

impl Composition {
    pub fn plan(&self) -> Option<&SessionPlan> {
        match self {
            Self::Ready(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn into_plan(self) -> Option<SessionPlan> {
        match self {
            Self::Ready(plan) => Some(plan),
            _ => None,
        }
    }
}

/// Compose a session of at most `cap` items.
///
/// Due items come first, ordered by due time with ties in input order.
/// Fresh items fill any remaining room in collection order. Future items
/// are never selected. A `cap` of zero yields a plan with no items.
pub fn compose(items: &[Item], states: &[ReviewState], now: DateTime<Utc>, cap: usize) -> Composition {
    if items.is_empty() {
        return Composition::Empty;
    }

    let mut classification = classify(items, states, now);

    // `sort_by_key` is stable, so equal due times keep their input order.
    classification.due.sort_by_key(|d| d.due_at);

    let due_count = classification.due.len();
    let fresh_count = classification.fresh.len();
    let future_count = classification.future.len();

    if due_count == 0 && fresh_count == 0 {
        return Composition::NothingDue {
            total: future_count,
            next_due_at: next_due_at(items, states, now),
        };
    }

    let selected: Vec<Item> = classification
        .due
        .iter()
        .map(|d| d.item)
        .chain(classification.fresh.iter().copied())
        .take(cap)
        .cloned()
        .collect();

    log::debug!(
        "Composed session of {} items (cap {}, due {}, fresh {}, future {})",
        selected.len(),
        cap,
        due_count,
        fresh_count,
        future_count
    );

    Composition::Ready(SessionPlan {
        items: selected,
        due_count,
        fresh_count,
        future_count,
    })
}

/// Earliest future due time among the given items, for "come back at" hints
fn next_due_at(items: &[Item], states: &[ReviewState], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lookup = super::classifier::index_states(states);
    items
        .iter()
        .filter_map(|item| lookup.get(&(item.item_type(), item.id())))
        .filter_map(|state| state.next_review_at)
        .filter(|at| *at > now)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::models::{SentenceItem, VocabItem};
    use chrono::{Duration, TimeZone};

    fn vocab(id: usize) -> Item {
        Item::Vocab(VocabItem {
            id: format!("v{}", id),
            video_id: Some("12".to_string()),
            word: format!("word{}", id),
            translation: None,
            phonetic: None,
            source_episode: None,
        })
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
    }

    fn due_state(id: usize, hours_ago: i64) -> ReviewState {
        ReviewState::new(ItemType::Vocab, format!("v{}", id))
            .with_next_review_at(now() - Duration::hours(hours_ago))
    }

    fn ids(plan: &SessionPlan) -> Vec<String> {
        plan.items.iter().map(|i| i.id().to_string()).collect()
    }

    #[test]
    fn test_due_then_fresh_fills_cap() {
        // "Kitchen": 25 vocab, 5 overdue, 20 never reviewed
        let items: Vec<Item> = (0..25).map(vocab).collect();
        let states: Vec<ReviewState> = (0..5).map(|i| due_state(i, 10 - i as i64)).collect();

        let plan = compose(&items, &states, now(), 20).into_plan().unwrap();

        assert_eq!(plan.len(), 20);
        assert_eq!(plan.due_count, 5);
        let expected: Vec<String> = (0..20).map(|i| format!("v{}", i)).collect();
        assert_eq!(ids(&plan), expected);
    }

    #[test]
    fn test_due_sorted_and_capped() {
        let items: Vec<Item> = (0..40).map(vocab).collect();
        // 30 due items, later ids are more overdue
        let states: Vec<ReviewState> = (0..30).map(|i| due_state(i, i as i64 + 1)).collect();

        let plan = compose(&items, &states, now(), 20).into_plan().unwrap();

        assert_eq!(plan.len(), 20);
        assert_eq!(plan.due_count, 30);
        let expected: Vec<String> = (10..30).rev().map(|i| format!("v{}", i)).collect();
        assert_eq!(ids(&plan), expected);
        assert!(plan.items.iter().all(|i| i.id() != "v35"));
    }

    #[test]
    fn test_equal_due_times_keep_input_order() {
        let items: Vec<Item> = (0..4).map(vocab).collect();
        let states = vec![due_state(3, 2), due_state(1, 2), due_state(2, 5), due_state(0, 2)];

        let plan = compose(&items, &states, now(), 10).into_plan().unwrap();
        assert_eq!(ids(&plan), vec!["v2", "v0", "v1", "v3"]);
    }

    #[test]
    fn test_future_items_never_selected() {
        let items: Vec<Item> = (0..3).map(vocab).collect();
        let states = vec![
            ReviewState::new(ItemType::Vocab, "v0").with_next_review_at(now() + Duration::days(3)),
            ReviewState::new(ItemType::Vocab, "v1"),
        ];

        let plan = compose(&items, &states, now(), 10).into_plan().unwrap();
        assert_eq!(ids(&plan), vec!["v2"]);
        assert_eq!(plan.future_count, 2);
    }

    #[test]
    fn test_nothing_due_is_distinct_from_empty() {
        assert_eq!(compose(&[], &[], now(), 20), Composition::Empty);

        let items: Vec<Item> = (0..2).map(vocab).collect();
        let later = now() + Duration::days(1);
        let states = vec![
            ReviewState::new(ItemType::Vocab, "v0").with_next_review_at(now() + Duration::days(4)),
            ReviewState::new(ItemType::Vocab, "v1").with_next_review_at(later),
        ];

        assert_eq!(
            compose(&items, &states, now(), 20),
            Composition::NothingDue {
                total: 2,
                next_due_at: Some(later)
            }
        );
    }

    #[test]
    fn test_sentence_cap_from_caps() {
        let caps = SessionCaps::default();
        assert_eq!(caps.for_type(ItemType::Vocab), 20);
        assert_eq!(caps.for_type(ItemType::Sentence), 50);

        let items: Vec<Item> = (0..60)
            .map(|i| {
                Item::Sentence(SentenceItem {
                    id: i.to_string(),
                    video_id: None,
                    text: format!("sentence {}", i),
                    translation: None,
                    source_episode: None,
                })
            })
            .collect();
        let plan = compose(&items, &[], now(), caps.for_type(ItemType::Sentence))
            .into_plan()
            .unwrap();
        assert_eq!(plan.len(), 50);
        assert_eq!(plan.fresh_count, 60);
    }

    #[test]
    fn test_never_exceeds_cap() {
        let items: Vec<Item> = (0..3).map(vocab).collect();
        let states = vec![due_state(0, 1)];
        for cap in 0..5 {
            let plan = compose(&items, &states, now(), cap).into_plan().unwrap();
            assert!(plan.len() <= cap, "{} items selected with cap {}", plan.len(), cap);
        }
        let empty = compose(&items, &[], now(), 0).into_plan().unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.fresh_count, 3);
    }
}
