use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

pub use crate::cli_ops::*;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(bin_name = "tally")]
#[command(version)]
#[command(about = "Track counters, ticks, and checklist notes in a local SQLite store")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "TALLY_DB_PATH",
        default_value = ".tally/tally.sqlite",
        help = "Path to the SQLite database."
    )]
    pub db: String,

    #[arg(
        short = 'c',
        long,
        env = "TALLY_CONFIG",
        default_value = ".tally/config.toml",
        help = "Path to the optional TOML config file."
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create, list, show, rename, and remove counters.")]
    Counter(CounterArgs),
    #[command(about = "Record, list, edit, and remove ticks.")]
    Tick(TickArgs),
    #[command(about = "Show stats for one counter or totals for all counters.")]
    Stats(StatsArgs),
    #[command(about = "Show every counter with its stats, newest first.")]
    Board(BoardArgs),
    #[command(about = "Create, list, show, edit, and remove notes.")]
    Note(NoteArgs),
    #[command(about = "Manage checklist items on a note.")]
    Item(ItemArgs),
    #[command(about = "Show database location, schema version, and row counts.")]
    Status(JsonArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
#[command(about = "Generate or install shell completions.")]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write completions to the canonical path for the shell."
    )]
    pub install: bool,
}

#[derive(Debug, Clone, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

/// Shared `--field/--since/--until/--json` flags for listing commands.
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    #[arg(
        short = 'f',
        long,
        help = "Time field to filter and sort on (created, modified, data)."
    )]
    pub field: Option<String>,

    #[arg(long, help = "Inclusive lower bound (RFC 3339 or YYYY-MM-DD).")]
    pub since: Option<String>,

    #[arg(long, help = "Inclusive upper bound (RFC 3339 or YYYY-MM-DD).")]
    pub until: Option<String>,

    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
