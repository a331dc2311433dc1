//! Boundaries to the review data store
//!
//! - `SnapshotSource` reads notebooks, items and review states
//! - `ReviewOutcomeGateway` records answers; it is the only path by which
//!   later snapshots see updated review states
//! - `ReviewLogSource` reads the answer history for statistics
//!
//! `client::ApiClient` talks to the hosted service, `crate::local::LocalStore`
//! keeps everything on disk.

pub mod cache;
pub mod client;

use async_trait::async_trait;
use thiserror::Error;

use crate::local::LocalStoreError;
use crate::review::models::{
    ItemType, NotebookCounts, ReviewLogEntry, ReviewOutcome, ReviewState, Snapshot,
};

pub use cache::{CachingSource, ReviewStateCache};
pub use client::ApiClient;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Authentication failed")]
    AuthFailed,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Local store error: {0}")]
    Local(#[from] LocalStoreError),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Source of notebook contents. Every call returns data from a single read,
/// so items and states in one snapshot are consistent with each other.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// All notebooks of the current user with their per-type counts
    async fn notebooks(&self) -> Result<Vec<NotebookCounts>>;

    /// Items of one type in one notebook, in collection order, with their states
    async fn notebook_snapshot(&self, notebook_id: &str, item_type: ItemType) -> Result<Snapshot>;
}

/// Sink for review outcomes
#[async_trait]
pub trait ReviewOutcomeGateway: Send + Sync {
    /// Record one answer. Returns the updated state when the store echoes it.
    async fn record(&self, outcome: &ReviewOutcome) -> Result<Option<ReviewState>>;
}

/// Source of the per-answer review history
#[async_trait]
pub trait ReviewLogSource: Send + Sync {
    async fn review_logs(&self, days: u32) -> Result<Vec<ReviewLogEntry>>;
}
