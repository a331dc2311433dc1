mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use notebook_review_lib::review::{ItemType, MAX_STATS_DAYS};

#[derive(Parser)]
#[command(name = "review-cli", about = "Review notebook vocabulary and sentences", version)]
struct Cli {
    /// Use a specific config file (default: user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TypeArg {
    Vocab,
    Sentence,
}

impl From<TypeArg> for ItemType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Vocab => ItemType::Vocab,
            TypeArg::Sentence => ItemType::Sentence,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List notebooks with item and due counts
    Notebooks,

    /// Show the items the next session would contain
    Plan {
        /// Notebook name (case-insensitive prefix match) or id
        notebook: String,
        /// Item type
        #[arg(long = "type", value_enum, default_value = "vocab")]
        item_type: TypeArg,
        /// Override the configured session cap
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        cap: Option<usize>,
    },

    /// Run an interactive review session
    Review {
        /// Notebook name (case-insensitive prefix match) or id
        notebook: String,
        /// Item type
        #[arg(long = "type", value_enum, default_value = "vocab")]
        item_type: TypeArg,
        /// Discard saved progress and start from the first item
        #[arg(long)]
        restart: bool,
    },

    /// Daily review counts and streak
    Stats {
        /// Number of days to show
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=MAX_STATS_DAYS as i64))]
        days: u32,
    },

    /// Add an item to a local notebook (created if missing)
    Add {
        /// Notebook name
        notebook: String,
        /// Item type
        #[arg(value_enum)]
        kind: TypeArg,
        /// Word or sentence text
        text: String,
        /// Translation
        translation: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config)?;

    match cli.command {
        Command::Notebooks => {
            commands::notebooks::run(&app, &cli.format, use_color).await?;
        }
        Command::Plan { notebook, item_type, cap } => {
            commands::plan::run(&app, &notebook, item_type.into(), cap, &cli.format, use_color)
                .await?;
        }
        Command::Review { notebook, item_type, restart } => {
            commands::review::run(&app, &notebook, item_type.into(), restart, use_color).await?;
        }
        Command::Stats { days } => {
            commands::stats::run(&app, days, &cli.format, use_color).await?;
        }
        Command::Add { notebook, kind, text, translation } => {
            commands::add::run(&app, &notebook, kind.into(), text, translation, &cli.format)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cap_is_rejected() {
        assert!(Cli::try_parse_from(["review-cli", "plan", "kitchen", "--cap", "0"]).is_err());
        assert!(Cli::try_parse_from(["review-cli", "plan", "kitchen", "--cap", "1"]).is_ok());
    }

    #[test]
    fn test_days_are_bounded() {
        assert!(Cli::try_parse_from(["review-cli", "stats", "--days", "0"]).is_err());
        assert!(Cli::try_parse_from(["review-cli", "stats", "--days", "366"]).is_ok());
        assert!(Cli::try_parse_from(["review-cli", "stats", "--days", "4000000000"]).is_err());
    }
}
