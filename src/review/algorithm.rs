//! Familiarity ladder used by the offline store
//!
//! The hosted service computes the next review time on its own; this rule
//! only drives `LocalStore` so that offline notebooks still get scheduled.
//!
//! - "known" climbs one rung (a first-ever answer lands on rung 1)
//! - "unknown" drops back to rung 0
//! - each rung maps to a fixed interval in days

use chrono::{DateTime, Duration, Utc};

use super::models::{ItemType, ReviewState};

/// Highest familiarity rung
pub const MAX_LEVEL: u8 = 5;

/// Days until the next review, indexed by familiarity rung
const INTERVAL_DAYS: [i64; 6] = [1, 3, 7, 14, 30, 60];

/// Result of applying one outcome to a review state
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub level: u8,
    pub interval_days: i64,
    pub next_review_at: DateTime<Utc>,
}

/// Familiarity rung carried by a stored state
pub fn current_level(state: Option<&ReviewState>) -> Option<u8> {
    state
        .and_then(|s| s.familiarity_level)
        .map(|level| level.clamp(0.0, MAX_LEVEL as f64).round() as u8)
}

/// Compute the next rung and due time after an answer
pub fn calculate_next_review(
    state: Option<&ReviewState>,
    is_known: bool,
    now: DateTime<Utc>,
) -> ReviewResult {
    let level = match (current_level(state), is_known) {
        (_, false) => 0,
        (None, true) => 1,
        (Some(level), true) => (level + 1).min(MAX_LEVEL),
    };
    let interval_days = INTERVAL_DAYS[level as usize];

    ReviewResult {
        level,
        interval_days,
        next_review_at: now + Duration::days(interval_days),
    }
}

/// Apply an answer to an optional existing state, producing the new state
pub fn apply_outcome(
    state: Option<&ReviewState>,
    item_type: ItemType,
    item_id: &str,
    is_known: bool,
    now: DateTime<Utc>,
) -> ReviewState {
    let result = calculate_next_review(state, is_known, now);
    let mut next = state
        .cloned()
        .unwrap_or_else(|| ReviewState::new(item_type, item_id));
    next.familiarity_level = Some(result.level as f64);
    next.next_review_at = Some(result.next_review_at);
    next.last_reviewed_at = Some(now);
    next
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: i64) -> String {
    if days <= 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
