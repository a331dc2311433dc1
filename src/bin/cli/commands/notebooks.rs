use anyhow::Result;

use notebook_review_lib::review::summarize;

use crate::app::App;
use crate::render::terminal::{paint, render_status, rule, truncate, Color};
use crate::OutputFormat;

pub async fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let notebooks = app.list_notebooks().await?;
    let summary = summarize(&notebooks);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "notebooks": notebooks,
                "summary": summary,
                "status": summary.status(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if notebooks.is_empty() {
                println!("No notebooks found.");
                return Ok(());
            }

            println!(
                "{:<28} {:>7} {:>7} {:>9} {:>9}",
                "NOTEBOOK", "VOCAB", "DUE", "SENTENCE", "DUE"
            );
            println!("{}", rule(64));
            for nb in &notebooks {
                let due_vocab = format!("{:>7}", nb.due_vocab_count);
                let due_sentence = format!("{:>9}", nb.due_sentence_count);
                println!(
                    "{:<28} {:>7} {} {:>9} {}",
                    truncate(&nb.name, 28),
                    nb.vocab_count,
                    highlight_due(&due_vocab, nb.due_vocab_count, use_color),
                    nb.sentence_count,
                    highlight_due(&due_sentence, nb.due_sentence_count, use_color),
                );
            }
            println!();

            let recommended = summary
                .first_due_notebook_id
                .as_deref()
                .and_then(|id| notebooks.iter().find(|nb| nb.id == id))
                .map(|nb| nb.name.as_str());
            println!("{}", render_status(&summary, recommended, use_color));
        }
    }

    Ok(())
}

fn highlight_due(cell: &str, due: usize, use_color: bool) -> String {
    if due > 0 {
        paint(cell, Color::YELLOW, use_color)
    } else {
        cell.to_string()
    }
}
