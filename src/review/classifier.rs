//! Partition of a notebook's items into due, fresh and future buckets

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::models::{Item, ItemType, ReviewState};

/// An item whose review state has come due, with the time it came due
#[derive(Debug, Clone, Copy)]
pub struct DueItem<'a> {
    pub item: &'a Item,
    pub due_at: DateTime<Utc>,
}

/// Result of classifying a set of items at one instant.
/// Each bucket keeps the relative input order of its items.
#[derive(Debug, Clone, Default)]
pub struct Classification<'a> {
    pub due: Vec<DueItem<'a>>,
    pub fresh: Vec<&'a Item>,
    pub future: Vec<&'a Item>,
}

impl Classification<'_> {
    pub fn total(&self) -> usize {
        self.due.len() + self.fresh.len() + self.future.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Build the `(item type, item id) -> state` lookup. The first state wins
/// when the store returned duplicates.
pub fn index_states(states: &[ReviewState]) -> HashMap<(ItemType, &str), &ReviewState> {
    let mut lookup = HashMap::with_capacity(states.len());
    for state in states {
        let key = (state.item_type, state.item_id.as_str());
        if lookup.contains_key(&key) {
            log::warn!(
                "Duplicate review state for {} {}, keeping the first one",
                state.item_type,
                state.item_id
            );
            continue;
        }
        lookup.insert(key, state);
    }
    lookup
}

/// Classify `items` against `states` as of `now`.
///
/// - no state: fresh
/// - state with `next_review_at <= now`: due
/// - anything else, including a state without a timestamp: future
pub fn classify<'a>(
    items: &'a [Item],
    states: &[ReviewState],
    now: DateTime<Utc>,
) -> Classification<'a> {
    let lookup = index_states(states);
    let mut result = Classification::default();

    for item in items {
        match lookup.get(&(item.item_type(), item.id())) {
            None => result.fresh.push(item),
            Some(state) => match state.next_review_at {
                Some(due_at) if due_at <= now => result.due.push(DueItem { item, due_at }),
                _ => result.future.push(item),
            },
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::models::VocabItem;
    use chrono::{Duration, TimeZone};

    fn vocab(id: &str) -> Item {
        Item::Vocab(VocabItem {
            id: id.to_string(),
            video_id: None,
            word: format!("word-{}", id),
            translation: None,
            phonetic: None,
            source_episode: None,
        })
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_partition_is_total_and_disjoint() {
        let items: Vec<Item> = ["a", "b", "c", "d", "e"].iter().map(|id| vocab(id)).collect();
        let states = vec![
            ReviewState::new(ItemType::Vocab, "a").with_next_review_at(now() - Duration::hours(1)),
            ReviewState::new(ItemType::Vocab, "b").with_next_review_at(now() + Duration::days(2)),
            ReviewState::new(ItemType::Vocab, "c"),
            ReviewState::new(ItemType::Vocab, "e").with_next_review_at(now()),
        ];

        let result = classify(&items, &states, now());

        let due: Vec<&str> = result.due.iter().map(|d| d.item.id()).collect();
        let fresh: Vec<&str> = result.fresh.iter().map(|i| i.id()).collect();
        let future: Vec<&str> = result.future.iter().map(|i| i.id()).collect();
        assert_eq!(due, vec!["a", "e"]);
        assert_eq!(fresh, vec!["d"]);
        assert_eq!(future, vec!["b", "c"]);
        assert_eq!(result.total(), items.len());
    }

    #[test]
    fn test_duplicate_states_keep_first() {
        let items = vec![vocab("a")];
        let states = vec![
            ReviewState::new(ItemType::Vocab, "a").with_next_review_at(now() + Duration::days(1)),
            ReviewState::new(ItemType::Vocab, "a").with_next_review_at(now() - Duration::days(1)),
        ];

        let result = classify(&items, &states, now());
        assert!(result.due.is_empty());
        assert_eq!(result.future.len(), 1);
    }

    #[test]
    fn test_state_of_other_type_does_not_match() {
        let items = vec![vocab("1")];
        let states = vec![
            ReviewState::new(ItemType::Sentence, "1").with_next_review_at(now() - Duration::days(1)),
        ];

        let result = classify(&items, &states, now());
        assert_eq!(result.fresh.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let result = classify(&[], &[], now());
        assert!(result.is_empty());
    }
}
