use notebook_review_lib::review::{algorithm, Item, ReviewState, StudyStatus, Summary};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap `text` in `color` when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Horizontal rule under table headers
pub fn rule(width: usize) -> String {
    "\u{2500}".repeat(width)
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}\u{2026}", cut)
}

/// One-line description of where the user stands across all notebooks
pub fn render_status(summary: &Summary, notebook_name: Option<&str>, use_color: bool) -> String {
    match summary.status() {
        StudyStatus::NoContent => "No items yet. Add words or sentences to a notebook first.".to_string(),
        StudyStatus::CaughtUp => paint(
            &format!("All caught up: {} items, nothing due.", summary.total_items()),
            Color::GREEN,
            use_color,
        ),
        StudyStatus::Due { due, notebook_id, tab } => {
            let target = notebook_name.unwrap_or(notebook_id.as_str());
            format!(
                "{} due. Next up: {} ({})",
                paint(&due.to_string(), Color::YELLOW, use_color),
                paint(target, Color::BOLD, use_color),
                tab
            )
        }
    }
}

/// Prompt line for a card, before the answer is revealed
pub fn render_prompt(item: &Item, position: usize, total: usize, use_color: bool) -> String {
    format!(
        "{} {}",
        paint(&format!("[{}/{}]", position, total), Color::DIM, use_color),
        paint(item.prompt(), Color::BOLD, use_color)
    )
}

/// The back of a card
pub fn render_answer(item: &Item, use_color: bool) -> String {
    let mut out = String::new();
    if let Item::Vocab(vocab) = item {
        if let Some(phonetic) = vocab.phonetic.as_deref().filter(|p| !p.is_empty()) {
            out.push_str(&paint(phonetic, Color::DIM, use_color));
            out.push(' ');
        }
    }
    out.push_str(&paint(
        item.translation().unwrap_or("(no translation)"),
        Color::CYAN,
        use_color,
    ));
    out
}

/// Familiarity and next review of a state as last recorded
pub fn render_schedule(state: &ReviewState, now: chrono::DateTime<chrono::Utc>) -> String {
    let level = state
        .familiarity_level
        .map(|l| format!("familiarity {}", l))
        .unwrap_or_else(|| "new".to_string());
    match state.next_review_at {
        Some(at) => format!(
            "{}, next review in {}",
            level,
            algorithm::format_interval(((at - now).num_hours() + 12) / 24)
        ),
        None => level,
    }
}
