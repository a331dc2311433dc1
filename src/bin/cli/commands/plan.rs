use anyhow::Result;
use chrono::{DateTime, Utc};

use notebook_review_lib::review::{compose, Composition, ItemType, NotebookCounts};

use crate::app::App;
use crate::render::terminal::{paint, rule, truncate, Color};
use crate::OutputFormat;

/// Resolve `notebook` and compose a session from a fresh snapshot
pub async fn load_composition(
    app: &App,
    notebook: &str,
    item_type: ItemType,
    cap: usize,
) -> Result<(NotebookCounts, Composition)> {
    let nb = app.find_notebook(notebook).await?;
    let snapshot = app.snapshot(&nb.id, item_type).await?;
    let composition = compose(&snapshot.items, &snapshot.states, snapshot.taken_at, cap);
    Ok((nb, composition))
}

pub async fn run(
    app: &App,
    notebook: &str,
    item_type: ItemType,
    cap: Option<usize>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let cap = cap.unwrap_or_else(|| app.cap_for(item_type));
    let (nb, composition) = load_composition(app, notebook, item_type, cap).await?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "notebook": { "id": nb.id, "name": nb.name },
                "itemType": item_type,
                "cap": cap,
                "composition": composition,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => match &composition {
            Composition::Empty => {
                println!("No {} items in {}.", item_type, nb.name);
            }
            Composition::NothingDue { total, next_due_at } => {
                println!(
                    "Nothing to review in {}: {} {} items, all scheduled for later.",
                    nb.name, total, item_type
                );
                if let Some(at) = next_due_at {
                    println!("Next item is due {}.", describe_due(*at, Utc::now()));
                }
            }
            Composition::Ready(plan) => {
                println!(
                    "{} ({}): {} of {} items, {} due, {} new, {} scheduled later",
                    paint(&nb.name, Color::BOLD, use_color),
                    item_type,
                    plan.len(),
                    plan.total_count(),
                    plan.due_count,
                    plan.fresh_count,
                    plan.future_count
                );
                println!("{}", rule(64));
                for (i, item) in plan.items.iter().enumerate() {
                    println!(
                        "{:>3}. {:<40} {}",
                        i + 1,
                        truncate(item.prompt(), 40),
                        paint(
                            &truncate(item.translation().unwrap_or(""), 20),
                            Color::DIM,
                            use_color
                        )
                    );
                }
            }
        },
    }

    Ok(())
}

fn describe_due(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (at - now).num_hours();
    if hours < 1 {
        "within the hour".to_string()
    } else if hours < 24 {
        format!("in {} hours", hours)
    } else {
        format!("on {}", at.format("%Y-%m-%d"))
    }
}
