//! Cross-notebook summary and "where to study next"

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::classifier::classify;
use super::models::{Item, ItemType, NotebookCounts, NotebookInfo, ReviewState};

/// Totals across all notebooks plus the first notebook with work due
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_notebooks: usize,
    pub total_vocab: usize,
    pub total_sentence: usize,
    pub total_due_vocab: usize,
    pub total_due_sentence: usize,
    pub first_due_notebook_id: Option<String>,
    pub first_due_notebook_tab: Option<ItemType>,
}

/// The three end states a caller has to tell apart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StudyStatus {
    /// No notebook holds any item
    NoContent,
    /// Items exist but none is due
    CaughtUp,
    /// `due` items waiting, starting with `notebook_id` on `tab`
    #[serde(rename_all = "camelCase")]
    Due {
        due: usize,
        notebook_id: String,
        tab: ItemType,
    },
}

impl Summary {
    pub fn total_items(&self) -> usize {
        self.total_vocab + self.total_sentence
    }

    pub fn total_due(&self) -> usize {
        self.total_due_vocab + self.total_due_sentence
    }

    pub fn status(&self) -> StudyStatus {
        match (&self.first_due_notebook_id, self.first_due_notebook_tab) {
            (Some(notebook_id), Some(tab)) => StudyStatus::Due {
                due: self.total_due(),
                notebook_id: notebook_id.clone(),
                tab,
            },
            _ if self.total_items() == 0 => StudyStatus::NoContent,
            _ => StudyStatus::CaughtUp,
        }
    }
}

/// Combine per-notebook counts, in list order.
///
/// The recommended notebook is the first one with anything due; within it
/// vocab is preferred over sentences.
pub fn summarize(notebooks: &[NotebookCounts]) -> Summary {
    let mut summary = Summary {
        total_notebooks: notebooks.len(),
        ..Summary::default()
    };

    for notebook in notebooks {
        summary.total_vocab += notebook.vocab_count;
        summary.total_sentence += notebook.sentence_count;
        summary.total_due_vocab += notebook.due_vocab_count;
        summary.total_due_sentence += notebook.due_sentence_count;

        if summary.first_due_notebook_id.is_none() {
            let tab = if notebook.due_vocab_count > 0 {
                Some(ItemType::Vocab)
            } else if notebook.due_sentence_count > 0 {
                Some(ItemType::Sentence)
            } else {
                None
            };
            if let Some(tab) = tab {
                summary.first_due_notebook_id = Some(notebook.id.clone());
                summary.first_due_notebook_tab = Some(tab);
            }
        }
    }

    summary
}

/// Per-type counts for one notebook computed from its items and states
pub fn notebook_counts(
    notebook: &NotebookInfo,
    items: &[Item],
    states: &[ReviewState],
    now: DateTime<Utc>,
) -> NotebookCounts {
    let mut counts = NotebookCounts {
        id: notebook.id.clone(),
        name: notebook.name.clone(),
        color: notebook.color.clone(),
        vocab_count: 0,
        sentence_count: 0,
        due_vocab_count: 0,
        due_sentence_count: 0,
    };

    let classification = classify(items, states, now);
    for item in items {
        match item.item_type() {
            ItemType::Vocab => counts.vocab_count += 1,
            ItemType::Sentence => counts.sentence_count += 1,
        }
    }
    for due in &classification.due {
        match due.item.item_type() {
            ItemType::Vocab => counts.due_vocab_count += 1,
            ItemType::Sentence => counts.due_sentence_count += 1,
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::models::{SentenceItem, VocabItem};
    use chrono::{Duration, TimeZone};

    fn counts(id: &str, vocab: usize, sentence: usize, due_vocab: usize, due_sentence: usize) -> NotebookCounts {
        NotebookCounts {
            id: id.to_string(),
            name: id.to_uppercase(),
            color: None,
            vocab_count: vocab,
            sentence_count: sentence,
            due_vocab_count: due_vocab,
            due_sentence_count: due_sentence,
        }
    }

    #[test]
    fn test_no_notebooks_is_no_content() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_notebooks, 0);
        assert_eq!(summary.status(), StudyStatus::NoContent);
    }

    #[test]
    fn test_empty_notebooks_are_no_content() {
        let summary = summarize(&[counts("a", 0, 0, 0, 0), counts("b", 0, 0, 0, 0)]);
        assert_eq!(summary.total_notebooks, 2);
        assert_eq!(summary.status(), StudyStatus::NoContent);
    }

    #[test]
    fn test_content_without_due_is_caught_up() {
        let summary = summarize(&[counts("a", 4, 0, 0, 0), counts("b", 0, 2, 0, 0)]);
        assert_eq!(summary.first_due_notebook_id, None);
        assert_eq!(summary.first_due_notebook_tab, None);
        assert_eq!(summary.status(), StudyStatus::CaughtUp);
    }

    #[test]
    fn test_first_due_notebook_in_list_order() {
        let summary = summarize(&[
            counts("a", 4, 3, 0, 0),
            counts("b", 5, 6, 0, 2),
            counts("c", 7, 0, 3, 0),
        ]);

        assert_eq!(summary.total_vocab, 16);
        assert_eq!(summary.total_sentence, 9);
        assert_eq!(summary.total_due_vocab, 3);
        assert_eq!(summary.total_due_sentence, 2);
        assert_eq!(
            summary.status(),
            StudyStatus::Due {
                due: 5,
                notebook_id: "b".to_string(),
                tab: ItemType::Sentence
            }
        );
    }

    #[test]
    fn test_vocab_tab_preferred() {
        let summary = summarize(&[counts("a", 4, 3, 1, 3)]);
        assert_eq!(summary.first_due_notebook_tab, Some(ItemType::Vocab));
    }

    #[test]
    fn test_notebook_counts_use_strict_due() {
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 3, 0, 0).unwrap();
        let notebook = NotebookInfo {
            id: "k".to_string(),
            name: "Kitchen".to_string(),
            color: None,
        };
        let mut items: Vec<Item> = (0..25)
            .map(|i| {
                Item::Vocab(VocabItem {
                    id: i.to_string(),
                    video_id: None,
                    word: format!("w{}", i),
                    translation: None,
                    phonetic: None,
                    source_episode: None,
                })
            })
            .collect();
        items.push(Item::Sentence(SentenceItem {
            id: "0".to_string(),
            video_id: None,
            text: "s".to_string(),
            translation: None,
            source_episode: None,
        }));
        let states: Vec<ReviewState> = (0..5)
            .map(|i| {
                ReviewState::new(ItemType::Vocab, i.to_string())
                    .with_next_review_at(now - Duration::days(1))
            })
            .collect();

        let counts = notebook_counts(&notebook, &items, &states, now);
        assert_eq!(counts.vocab_count, 25);
        assert_eq!(counts.due_vocab_count, 5);
        assert_eq!(counts.sentence_count, 1);
        assert_eq!(counts.due_sentence_count, 0);
    }
}
