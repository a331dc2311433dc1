//! Daily review counts and streak over the recent history

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::Serialize;

use super::models::{ItemType, ReviewLogEntry};

/// Reviews done on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub label: String,
    pub total: usize,
    pub vocab: usize,
    pub sentence: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_count: usize,
    pub vocab_count: usize,
    pub sentence_count: usize,
    /// Consecutive days with at least one review, counting back from today
    pub current_streak: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    /// Most recent day first
    pub days: Vec<DayStats>,
    pub summary: StatsSummary,
}

#[derive(Default)]
struct Tally {
    total: usize,
    vocab: usize,
    sentence: usize,
}

/// Longest history window, in days
pub const MAX_STATS_DAYS: u32 = 366;

/// Group `logs` by calendar day in the timezone of `now`, covering the
/// `days` days that end today (at most [`MAX_STATS_DAYS`]).
///
/// Rows without a known item type count toward the day total only.
pub fn daily_stats<Tz: TimeZone>(logs: &[ReviewLogEntry], now: &DateTime<Tz>, days: u32) -> ReviewStats {
    let days = days.min(MAX_STATS_DAYS);
    let tz = now.timezone();
    let today = now.date_naive();

    let mut by_date: HashMap<NaiveDate, Tally> = HashMap::new();
    for log in logs {
        let date = log.created_at.with_timezone(&tz).date_naive();
        let tally = by_date.entry(date).or_default();
        tally.total += 1;
        match log.item_type {
            Some(ItemType::Vocab) => tally.vocab += 1,
            Some(ItemType::Sentence) => tally.sentence += 1,
            None => {}
        }
    }

    let days: Vec<DayStats> = (0..days as i64)
        .map(|offset| {
            let date = today - Duration::days(offset);
            let tally = by_date.remove(&date).unwrap_or_default();
            DayStats {
                date,
                label: day_label(date, offset),
                total: tally.total,
                vocab: tally.vocab,
                sentence: tally.sentence,
            }
        })
        .collect();

    let summary = StatsSummary {
        total_count: days.iter().map(|d| d.total).sum(),
        vocab_count: days.iter().map(|d| d.vocab).sum(),
        sentence_count: days.iter().map(|d| d.sentence).sum(),
        current_streak: days.iter().take_while(|d| d.total > 0).count(),
    };

    ReviewStats { days, summary }
}

fn day_label(date: NaiveDate, days_ago: i64) -> String {
    match days_ago {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        _ => format!("{}-{:02}", date.month(), date.day()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn log(item_type: ItemType, at: DateTime<Utc>) -> ReviewLogEntry {
        ReviewLogEntry {
            item_type: Some(item_type),
            item_id: None,
            is_known: Some(true),
            created_at: at,
        }
    }

    #[test]
    fn test_groups_by_day_and_counts_streak() {
        let now = Utc.with_ymd_and_hms(2026, 7, 10, 15, 0, 0).unwrap();
        let logs = vec![
            log(ItemType::Vocab, now - Duration::hours(1)),
            log(ItemType::Sentence, now - Duration::hours(2)),
            log(ItemType::Vocab, now - Duration::days(1)),
            log(ItemType::Vocab, now - Duration::days(3)),
            log(ItemType::Vocab, now - Duration::days(30)),
        ];

        let stats = daily_stats(&logs, &now, 7);

        assert_eq!(stats.days.len(), 7);
        assert_eq!(stats.days[0].label, "today");
        assert_eq!(stats.days[0].total, 2);
        assert_eq!(stats.days[0].vocab, 1);
        assert_eq!(stats.days[0].sentence, 1);
        assert_eq!(stats.days[1].label, "yesterday");
        assert_eq!(stats.days[3].label, "7-07");
        assert_eq!(stats.days[3].total, 1);

        assert_eq!(stats.summary.total_count, 4);
        assert_eq!(stats.summary.vocab_count, 3);
        assert_eq!(stats.summary.sentence_count, 1);
        assert_eq!(stats.summary.current_streak, 2);
    }

    #[test]
    fn test_streak_zero_without_review_today() {
        let now = Utc.with_ymd_and_hms(2026, 7, 10, 15, 0, 0).unwrap();
        let logs = vec![log(ItemType::Vocab, now - Duration::days(1))];

        let stats = daily_stats(&logs, &now, 7);
        assert_eq!(stats.summary.current_streak, 0);
        assert_eq!(stats.summary.total_count, 1);
    }

    #[test]
    fn test_untyped_rows_count_in_total_only() {
        let now = Utc.with_ymd_and_hms(2026, 7, 10, 15, 0, 0).unwrap();
        let mut untyped = log(ItemType::Vocab, now - Duration::hours(3));
        untyped.item_type = None;
        let logs = vec![log(ItemType::Vocab, now - Duration::hours(1)), untyped];

        let stats = daily_stats(&logs, &now, 7);
        assert_eq!(stats.days[0].total, 2);
        assert_eq!(stats.days[0].vocab, 1);
        assert_eq!(stats.days[0].sentence, 0);
        assert_eq!(stats.summary.total_count, 2);
        assert_eq!(stats.summary.vocab_count, 1);
    }

    #[test]
    fn test_window_is_bounded() {
        let now = Utc.with_ymd_and_hms(2026, 7, 10, 15, 0, 0).unwrap();
        let stats = daily_stats(&[], &now, u32::MAX);
        assert_eq!(stats.days.len(), MAX_STATS_DAYS as usize);
    }

    #[test]
    fn test_days_follow_local_timezone() {
        // 23:30 UTC on the 9th is already the 10th in UTC+8
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 7, 10, 9, 0, 0).unwrap();
        let logs = vec![log(
            ItemType::Sentence,
            Utc.with_ymd_and_hms(2026, 7, 9, 23, 30, 0).unwrap(),
        )];

        let stats = daily_stats(&logs, &now, 2);
        assert_eq!(stats.days[0].total, 1);
        assert_eq!(stats.days[1].total, 0);
    }
}
