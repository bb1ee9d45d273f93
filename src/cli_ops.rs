use clap::{Args, Subcommand};

use crate::cli::{JsonArgs, RangeArgs};

#[derive(Debug, Args)]
pub struct CounterArgs {
    #[command(subcommand)]
    pub command: CounterSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum CounterSubcommands {
    #[command(about = "Create a counter.")]
    New(CounterNewArgs),
    #[command(about = "List counters.")]
    Ls(RangeArgs),
    #[command(about = "Show one counter with stats and recent ticks.")]
    Show(CounterShowArgs),
    #[command(about = "Rename a counter.")]
    Rename(CounterRenameArgs),
    #[command(about = "Remove a counter and all of its ticks.")]
    Rm(CounterRefArgs),
}

#[derive(Debug, Args)]
pub struct CounterNewArgs {
    #[arg(help = "Counter name.")]
    pub name: String,

    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CounterRefArgs {
    #[arg(help = "Counter id or name.")]
    pub counter: String,
}

#[derive(Debug, Args)]
pub struct CounterShowArgs {
    #[arg(help = "Counter id or name.")]
    pub counter: String,

    #[arg(long, help = "Only count ticks at or after this data time.")]
    pub since: Option<String>,

    #[arg(long, help = "Only count ticks at or before this data time.")]
    pub until: Option<String>,

    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CounterRenameArgs {
    #[arg(help = "Counter id or name.")]
    pub counter: String,

    #[arg(help = "New counter name.")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct TickArgs {
    #[command(subcommand)]
    pub command: TickSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TickSubcommands {
    #[command(about = "Record a tick on a counter.")]
    Add(TickAddArgs),
    #[command(about = "List ticks, optionally for one counter.")]
    Ls(TickListArgs),
    #[command(about = "Change a tick's amount or data time.")]
    Edit(TickEditArgs),
    #[command(about = "Remove a tick.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct TickAddArgs {
    #[arg(help = "Counter id or name.")]
    pub counter: String,

    #[arg(
        default_value_t = 1.0,
        allow_negative_numbers = true,
        help = "Amount to record; negative values decrement."
    )]
    pub amount: f64,

    #[arg(long, help = "Time the data refers to (defaults to now).")]
    pub at: Option<String>,

    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TickListArgs {
    #[arg(help = "Counter id or name; all counters when omitted.")]
    pub counter: Option<String>,

    #[command(flatten)]
    pub range: RangeArgs,
}

#[derive(Debug, Args)]
pub struct TickEditArgs {
    #[arg(help = "Tick id.")]
    pub id: i64,

    #[arg(long, allow_negative_numbers = true, help = "New amount.")]
    pub amount: Option<f64>,

    #[arg(long, help = "New data time.")]
    pub at: Option<String>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Row id.")]
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(help = "Counter id or name; totals for every counter when omitted.")]
    pub counter: Option<String>,

    #[command(flatten)]
    pub range: RangeArgs,
}

#[derive(Debug, Args)]
pub struct BoardArgs {
    #[arg(long, help = "Only count ticks at or after this data time.")]
    pub since: Option<String>,

    #[arg(long, help = "Only count ticks at or before this data time.")]
    pub until: Option<String>,

    #[command(flatten)]
    pub output: JsonArgs,
}

#[derive(Debug, Args)]
pub struct NoteArgs {
    #[command(subcommand)]
    pub command: NoteSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum NoteSubcommands {
    #[command(about = "Create a note.")]
    New(NoteNewArgs),
    #[command(about = "List notes with their checklist state.")]
    Ls(RangeArgs),
    #[command(about = "Show one note and its items.")]
    Show(NoteShowArgs),
    #[command(about = "Edit note fields.")]
    Edit(NoteEditArgs),
    #[command(about = "Remove a note and its items.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct NoteNewArgs {
    #[arg(help = "Note title.")]
    pub title: String,

    #[arg(short = 's', long, help = "Optional subtitle.")]
    pub subtitle: Option<String>,

    #[arg(short = 'D', long = "desc", help = "Optional description text.")]
    pub desc: Option<String>,

    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct NoteShowArgs {
    #[arg(help = "Note id.")]
    pub id: i64,

    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct NoteEditArgs {
    #[arg(help = "Note id.")]
    pub id: i64,

    #[arg(long, help = "New title.")]
    pub title: Option<String>,

    #[arg(short = 's', long, help = "New subtitle.")]
    pub subtitle: Option<String>,

    #[arg(short = 'D', long = "desc", help = "New description text.")]
    pub desc: Option<String>,
}

#[derive(Debug, Args)]
pub struct ItemArgs {
    #[command(subcommand)]
    pub command: ItemSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ItemSubcommands {
    #[command(about = "Add a checklist item to a note.")]
    Add(ItemAddArgs),
    #[command(about = "Edit item fields.")]
    Edit(ItemEditArgs),
    #[command(about = "Toggle an item between checked and unchecked.")]
    Check(IdArgs),
    #[command(about = "Set an item's check state explicitly.")]
    State(ItemStateArgs),
    #[command(about = "Remove an item.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct ItemAddArgs {
    #[arg(help = "Parent note id.")]
    pub note: i64,

    #[arg(help = "Item name.")]
    pub name: String,

    #[arg(long, help = "Optional field label.")]
    pub field: Option<String>,

    #[arg(short = 'D', long = "desc", help = "Optional description text.")]
    pub desc: Option<String>,

    #[arg(
        long,
        help = "Initial state (none, checked, unchecked, partial, default)."
    )]
    pub state: Option<String>,

    #[arg(long, help = "Render JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ItemEditArgs {
    #[arg(help = "Item id.")]
    pub id: i64,

    #[arg(long, help = "New name.")]
    pub name: Option<String>,

    #[arg(long, help = "New field label.")]
    pub field: Option<String>,

    #[arg(short = 'D', long = "desc", help = "New description text.")]
    pub desc: Option<String>,
}

#[derive(Debug, Args)]
pub struct ItemStateArgs {
    #[arg(help = "Item id.")]
    pub id: i64,

    #[arg(help = "State (none, checked, unchecked, partial, default).")]
    pub state: String,
}
