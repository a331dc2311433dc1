use anyhow::{Context, Result};

use notebook_review_lib::local::{new_sentence, new_vocab};
use notebook_review_lib::review::ItemType;

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    app: &App,
    notebook: &str,
    kind: ItemType,
    text: String,
    translation: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let store = app.local_store()?;

    let text = text.trim().to_string();
    if text.is_empty() {
        anyhow::bail!("Item text cannot be empty");
    }
    let translation = translation
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let notebooks = store.list_notebooks()?;
    let existing = notebooks
        .into_iter()
        .find(|nb| nb.id == notebook || nb.name.eq_ignore_ascii_case(notebook));
    let (nb, created) = match existing {
        Some(nb) => (nb, false),
        None => (
            store
                .create_notebook(notebook.to_string(), None)
                .context("Failed to create notebook")?,
            true,
        ),
    };

    let item = match kind {
        ItemType::Vocab => new_vocab(text, translation),
        ItemType::Sentence => new_sentence(text, translation),
    };
    let item = store
        .add_item(&nb.id, item)
        .with_context(|| format!("Failed to add item to {}", nb.name))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "notebook": { "id": nb.id, "name": nb.name, "created": created },
                "item": item,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if created {
                println!("Created notebook: {}", nb.name);
            }
            println!("Added {} to {}: {}", kind, nb.name, item.prompt());
        }
    }

    Ok(())
}
