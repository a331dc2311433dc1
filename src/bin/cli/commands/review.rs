use std::io::{self, Write};

use anyhow::Result;
use chrono::Utc;

use notebook_review_lib::review::{
    Composition, ItemType, ReviewSession, PROGRESS_VALIDITY_MINUTES,
};

use crate::app::App;
use crate::commands::plan::load_composition;
use crate::render::terminal::{
    paint, render_answer, render_prompt, render_schedule, Color,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Reveal,
    Known,
    Unknown,
    Quit,
}

fn parse_action(input: &str) -> Option<Action> {
    match input.trim().to_lowercase().as_str() {
        "" | "r" => Some(Action::Reveal),
        "k" | "y" => Some(Action::Known),
        "u" | "n" => Some(Action::Unknown),
        "q" => Some(Action::Quit),
        _ => None,
    }
}

/// Read one line from stdin; `None` on end of input
fn read_action() -> Result<Option<Action>> {
    loop {
        print!("  [enter] reveal  [k] known  [u] unknown  [q] quit > ");
        io::stdout().flush()?;

        let mut buf = String::new();
        if io::stdin().read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        match parse_action(&buf) {
            Some(action) => return Ok(Some(action)),
            None => println!("  Unrecognized input '{}'", buf.trim()),
        }
    }
}

pub async fn run(
    app: &App,
    notebook: &str,
    item_type: ItemType,
    restart: bool,
    use_color: bool,
) -> Result<()> {
    let cap = app.cap_for(item_type);
    let (nb, composition) = load_composition(app, notebook, item_type, cap).await?;

    let key = app.session_key(&nb.id, item_type);
    if restart {
        app.progress.clear(&key);
    }

    let plan = match composition {
        Composition::Ready(plan) => plan,
        Composition::Empty => {
            println!("No {} items in {}.", item_type, nb.name);
            return Ok(());
        }
        Composition::NothingDue { total, .. } => {
            println!(
                "{}",
                paint(
                    &format!("All {} {} items in {} are scheduled for later.", total, item_type, nb.name),
                    Color::GREEN,
                    use_color
                )
            );
            return Ok(());
        }
    };

    let mut session = ReviewSession::start(
        key,
        plan,
        app.progress.clone(),
        app.gateway.clone(),
        Utc::now(),
    );

    println!(
        "Reviewing {} {} items from {}",
        session.len(),
        item_type,
        paint(&nb.name, Color::BOLD, use_color)
    );
    if session.was_restored() {
        println!(
            "Resuming at item {} of {} (use --restart to start over)",
            session.current_index() + 1,
            session.len()
        );
    }
    println!();

    let mut pending = Vec::new();
    let mut answered = Vec::new();

    while let Some(item) = session.current() {
        println!(
            "{}",
            render_prompt(item, session.current_index() + 1, session.len(), use_color)
        );

        let is_known = loop {
            match read_action()? {
                None | Some(Action::Quit) => break None,
                Some(Action::Reveal) => {
                    if let Some(item) = session.current() {
                        println!("  {}", render_answer(item, use_color));
                    }
                }
                Some(Action::Known) => break Some(true),
                Some(Action::Unknown) => break Some(false),
            }
        };
        let Some(is_known) = is_known else {
            break;
        };

        if let Some(receipt) = session.answer(is_known, Utc::now()) {
            let mark = if receipt.is_known {
                paint("known", Color::GREEN, use_color)
            } else {
                paint("unknown", Color::RED, use_color)
            };
            println!("  {}: {}\n", mark, render_answer(&receipt.item, use_color));
            if let Some(handle) = receipt.recording {
                pending.push(handle);
            }
            answered.push(receipt.item);
        }
    }

    // Outcomes are written in the background; let them land before exiting.
    for handle in pending {
        if let Err(e) = handle.await {
            log::warn!("Outcome write task failed: {}", e);
        }
    }

    let stats = session.stats();
    println!(
        "{} known, {} unknown",
        paint(&stats.known.to_string(), Color::GREEN, use_color),
        paint(&stats.unknown.to_string(), Color::RED, use_color)
    );

    let now = Utc::now();
    for item in &answered {
        if let Some(state) = app.cache.get(&app.config.user_id, item.item_type(), item.id()) {
            println!(
                "  {:<30} {}",
                item.prompt(),
                paint(&render_schedule(&state, now), Color::DIM, use_color)
            );
        }
    }

    if session.is_complete() {
        println!("Session complete.");
    } else {
        println!(
            "Stopped at item {} of {}. Progress is kept for {} minutes.",
            session.current_index() + 1,
            session.len(),
            PROGRESS_VALIDITY_MINUTES
        );
    }

    Ok(())
}
