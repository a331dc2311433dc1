//! Review scheduling for notebook items
//!
//! This module provides:
//! - Classification of items into due, fresh and future
//! - Composition of bounded, ordered sessions per notebook and item type
//! - Session progress that survives reloads for a limited time
//! - Cross-notebook summaries recommending where to study next
//! - Daily review statistics

pub mod aggregator;
pub mod algorithm;
pub mod classifier;
pub mod composer;
pub mod models;
pub mod progress;
pub mod session;
pub mod stats;

pub use aggregator::{notebook_counts, summarize, StudyStatus, Summary};
pub use classifier::{classify, Classification, DueItem};
pub use composer::{compose, Composition, SessionCaps, SessionPlan};
pub use models::*;
pub use progress::{
    FileStore, KeyValueStore, MemoryStore, SessionKey, SessionProgress, SessionProgressStore,
    PROGRESS_VALIDITY_MINUTES,
};
pub use session::{AnswerReceipt, ReviewSession};
pub use stats::{daily_stats, ReviewStats, MAX_STATS_DAYS};
