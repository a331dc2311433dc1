use anyhow::{Context, Result};
use chrono::Local;

use notebook_review_lib::review::daily_stats;

use crate::app::App;
use crate::render::terminal::{paint, rule, Color};
use crate::OutputFormat;

const BAR_WIDTH: usize = 30;

pub async fn run(app: &App, days: u32, format: &OutputFormat, use_color: bool) -> Result<()> {
    let days = days.max(1);
    let logs = app
        .logs
        .review_logs(days)
        .await
        .context("Failed to load review history")?;
    let stats = daily_stats(&logs, &Local::now(), days);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            let max = stats.days.iter().map(|d| d.total).max().unwrap_or(0);

            println!("{:<10} {:>6} {:>6} {:>9}", "DAY", "TOTAL", "VOCAB", "SENTENCE");
            println!("{}", rule(34 + BAR_WIDTH));
            for day in &stats.days {
                println!(
                    "{:<10} {:>6} {:>6} {:>9}  {}",
                    day.label,
                    day.total,
                    day.vocab,
                    day.sentence,
                    paint(&bar(day.total, max), Color::CYAN, use_color)
                );
            }
            println!();
            println!(
                "{} reviews ({} vocab, {} sentence). Streak: {} day{}",
                stats.summary.total_count,
                stats.summary.vocab_count,
                stats.summary.sentence_count,
                paint(&stats.summary.current_streak.to_string(), Color::BOLD, use_color),
                if stats.summary.current_streak == 1 { "" } else { "s" }
            );
        }
    }

    Ok(())
}

fn bar(value: usize, max: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let width = (value * BAR_WIDTH).div_ceil(max);
    "\u{2588}".repeat(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_scales_to_max() {
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(10, 10).chars().count(), BAR_WIDTH);
        assert_eq!(bar(1, 100).chars().count(), 1);
    }
}
