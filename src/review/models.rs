//! Data models for review scheduling

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Kind of study item held in a notebook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Vocab,
    Sentence,
}

impl ItemType {
    pub const ALL: [ItemType; 2] = [ItemType::Vocab, ItemType::Sentence];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vocab => "vocab",
            Self::Sentence => "sentence",
        }
    }

    /// Review mode reported alongside each outcome
    pub fn review_mode(&self) -> &'static str {
        match self {
            Self::Vocab => "vocab_review",
            Self::Sentence => "sentence_review",
        }
    }
}

impl Default for ItemType {
    fn default() -> Self {
        Self::Vocab
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vocab" | "word" => Ok(Self::Vocab),
            "sentence" => Ok(Self::Sentence),
            other => Err(format!("Unknown item type: {}", other)),
        }
    }
}

/// A vocabulary entry saved into a notebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "video_id", deserialize_with = "deserialize_opt_id")]
    pub video_id: Option<String>,
    pub word: String,
    #[serde(default, alias = "meaning")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, alias = "episode", skip_serializing_if = "Option::is_none")]
    pub source_episode: Option<String>,
}

/// A subtitle sentence saved into a notebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "video_id", deserialize_with = "deserialize_opt_id")]
    pub video_id: Option<String>,
    #[serde(alias = "en")]
    pub text: String,
    #[serde(default, alias = "cn")]
    pub translation: Option<String>,
    #[serde(default, alias = "episode", skip_serializing_if = "Option::is_none")]
    pub source_episode: Option<String>,
}

/// One reviewable entry. Scheduling only looks at the id and the tag;
/// the payload is carried through for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "itemType", rename_all = "camelCase")]
pub enum Item {
    Vocab(VocabItem),
    Sentence(SentenceItem),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Self::Vocab(v) => &v.id,
            Self::Sentence(s) => &s.id,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Vocab(_) => ItemType::Vocab,
            Self::Sentence(_) => ItemType::Sentence,
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        match self {
            Self::Vocab(v) => v.video_id.as_deref(),
            Self::Sentence(s) => s.video_id.as_deref(),
        }
    }

    /// Prompt shown on the front of the review card
    pub fn prompt(&self) -> &str {
        match self {
            Self::Vocab(v) => &v.word,
            Self::Sentence(s) => &s.text,
        }
    }

    pub fn translation(&self) -> Option<&str> {
        match self {
            Self::Vocab(v) => v.translation.as_deref(),
            Self::Sentence(s) => s.translation.as_deref(),
        }
    }
}

/// Last known review state for one (user, item type, item id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    #[serde(alias = "item_type")]
    pub item_type: ItemType,
    #[serde(alias = "item_id", deserialize_with = "deserialize_id")]
    pub item_id: String,
    /// When the item becomes due. Missing or unparsable values mean "not due".
    #[serde(
        default,
        alias = "next_review_at",
        deserialize_with = "deserialize_lenient_timestamp"
    )]
    pub next_review_at: Option<DateTime<Utc>>,
    /// Opaque familiarity signal; forwarded for display only
    #[serde(default, alias = "familiarity_level", alias = "proficiency")]
    pub familiarity_level: Option<f64>,
    #[serde(
        default,
        alias = "last_reviewed_at",
        deserialize_with = "deserialize_lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    pub fn new(item_type: ItemType, item_id: impl Into<String>) -> Self {
        Self {
            item_type,
            item_id: item_id.into(),
            next_review_at: None,
            familiarity_level: None,
            last_reviewed_at: None,
        }
    }

    pub fn with_next_review_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_review_at = Some(at);
        self
    }

    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at.map_or(false, |at| at <= now)
    }
}

/// Running tally of answers within a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub known: u32,
    pub unknown: u32,
}

impl SessionStats {
    pub fn reviewed(&self) -> u32 {
        self.known + self.unknown
    }
}

/// Identity of a notebook as seen by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookInfo {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Per-notebook counts consumed by the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookCounts {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, alias = "vocab_count")]
    pub vocab_count: usize,
    #[serde(default, alias = "sentence_count")]
    pub sentence_count: usize,
    #[serde(default, alias = "due_vocab_count")]
    pub due_vocab_count: usize,
    #[serde(default, alias = "due_sentence_count")]
    pub due_sentence_count: usize,
}

impl NotebookCounts {
    pub fn total(&self, item_type: ItemType) -> usize {
        match item_type {
            ItemType::Vocab => self.vocab_count,
            ItemType::Sentence => self.sentence_count,
        }
    }

    pub fn due(&self, item_type: ItemType) -> usize {
        match item_type {
            ItemType::Vocab => self.due_vocab_count,
            ItemType::Sentence => self.due_sentence_count,
        }
    }
}

/// Items and states of one notebook and item type, read at a single point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub notebook: NotebookInfo,
    pub item_type: ItemType,
    pub items: Vec<Item>,
    pub states: Vec<ReviewState>,
    pub taken_at: DateTime<Utc>,
}

/// An answered item, as reported to the outcome gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub item_type: ItemType,
    pub item_id: String,
    pub is_known: bool,
    pub video_id: Option<String>,
    pub notebook_id: String,
    pub review_mode: String,
}

/// One row of the review history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    /// `None` for rows of a kind this crate does not review
    #[serde(default, alias = "item_type", deserialize_with = "deserialize_opt_item_type")]
    pub item_type: Option<ItemType>,
    #[serde(default, alias = "item_id", deserialize_with = "deserialize_opt_id")]
    pub item_id: Option<String>,
    #[serde(default, alias = "is_known", alias = "last_result_known")]
    pub is_known: Option<bool>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// Ids arrive as strings from some endpoints and as numbers from others
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_opt_item_type<'de, D>(deserializer: D) -> Result<Option<ItemType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

pub(crate) fn deserialize_lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => {
            log::warn!("Ignoring non-string timestamp {}", other);
            None
        }
    })
}

/// Parse an RFC 3339 or database-style timestamp; anything else is `None`
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    log::warn!("Unparsable review timestamp {:?}, treating as not due", raw);
    None
}
