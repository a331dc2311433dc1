//! Offline notebooks stored as JSON files
//!
//! Used when no hosted account is configured. Implements the same
//! snapshot, outcome and log traits as the API client, and schedules
//! answers with `review::algorithm`.

pub mod storage;

pub use storage::{new_sentence, new_vocab, LocalNotebook, LocalStore, LocalStoreError};
