use std::str::FromStr;

use tally::app::{self, App, AppError};
use tally::cli::{
    Cli, Commands, CounterSubcommands, ItemSubcommands, NoteSubcommands, RangeArgs,
    TickSubcommands,
};
use tally::config::Config;
use tally::domain::{CheckState, NoteItemPatch, NotePatch, TimeField, TimeRange};
use tally::ui::Printer;
use tally::{completions, logging};

fn main() {
    logging::init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

fn parse_field(raw: Option<&str>) -> Result<Option<TimeField>, AppError> {
    Ok(raw.map(TimeField::from_str).transpose()?)
}

fn parse_listing(args: &RangeArgs) -> Result<(Option<TimeField>, TimeRange), AppError> {
    let field = parse_field(args.field.as_deref())?;
    let range = app::parse_range(args.since.as_deref(), args.until.as_deref())?;
    Ok((field, range))
}

fn run() -> Result<(), AppError> {
    use clap::Parser;

    let cli = Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref(), args.install);
    }

    let config = Config::load(&cli.config)?;
    let app = App::open(&cli.db, config)?;
    tracing::debug!(db = %cli.db, "opened store");
    let printer = Printer::new(app.config(), app.now());

    match cli.command {
        Commands::Counter(args) => match args.command {
            CounterSubcommands::New(args) => {
                let counter = app.create_counter(&args.name)?;
                if args.json {
                    print_json(&counter)?;
                } else {
                    println!("created counter {} {}", counter.id, counter.name);
                }
            }
            CounterSubcommands::Ls(args) => {
                let (field, range) = parse_listing(&args)?;
                let counters = app.list_counters(field, &range)?;
                if args.json {
                    print_json(&counters)?;
                } else {
                    printer.counter_list(&counters, &range);
                }
            }
            CounterSubcommands::Show(args) => {
                let range = app::parse_range(args.since.as_deref(), args.until.as_deref())?;
                let detail = app.show_counter(&args.counter, &range)?;
                if args.json {
                    print_json(&detail)?;
                } else {
                    printer.counter_detail(&detail);
                }
            }
            CounterSubcommands::Rename(args) => {
                let counter = app.rename_counter(&args.counter, &args.name)?;
                println!("renamed counter {} -> {}", counter.id, counter.name);
            }
            CounterSubcommands::Rm(args) => {
                let counter = app.delete_counter(&args.counter)?;
                println!("removed counter {} {}", counter.id, counter.name);
            }
        },
        Commands::Tick(args) => match args.command {
            TickSubcommands::Add(args) => {
                let at = args.at.as_deref().map(app::parse_time).transpose()?;
                let tick = app.add_tick(&args.counter, args.amount, at)?;
                if args.json {
                    print_json(&tick)?;
                } else {
                    println!("added tick {} ({}) to {}", tick.id, tick.amount, tick.parent_id);
                }
            }
            TickSubcommands::Ls(args) => {
                let (field, range) = parse_listing(&args.range)?;
                let ticks = app.list_ticks(args.counter.as_deref(), field, &range)?;
                if args.range.json {
                    print_json(&ticks)?;
                } else {
                    printer.tick_list(&ticks, &range);
                }
            }
            TickSubcommands::Edit(args) => {
                let at = args.at.as_deref().map(app::parse_time).transpose()?;
                let tick = app.edit_tick(args.id, args.amount, at)?;
                println!("updated tick {} ({})", tick.id, tick.amount);
            }
            TickSubcommands::Rm(args) => {
                app.delete_tick(args.id)?;
                println!("removed tick {}", args.id);
            }
        },
        Commands::Stats(args) => {
            let (field, range) = parse_listing(&args.range)?;
            match args.counter.as_deref() {
                Some(counter) => {
                    if field.is_some_and(|field| field != TimeField::ForData) {
                        return Err(AppError::InvalidArgument(
                            "per-counter stats always filter on the data time".to_string(),
                        ));
                    }
                    let detail = app.show_counter(counter, &range)?;
                    if args.range.json {
                        print_json(&detail.stats)?;
                    } else {
                        printer.counter_detail(&detail);
                    }
                }
                None => {
                    let totals = app.totals(field, &range)?;
                    if args.range.json {
                        print_json(&totals)?;
                    } else {
                        printer.totals(&totals);
                    }
                }
            }
        }
        Commands::Board(args) => {
            let range = app::parse_range(args.since.as_deref(), args.until.as_deref())?;
            let board = app.board(range)?;
            if args.output.json {
                let rows: Vec<_> = board.rows();
                print_json(&rows)?;
            } else {
                printer.board(&board);
            }
        }
        Commands::Note(args) => match args.command {
            NoteSubcommands::New(args) => {
                let note =
                    app.create_note(&args.title, args.subtitle.as_deref(), args.desc.as_deref())?;
                if args.json {
                    print_json(&note)?;
                } else {
                    println!("created note {} {}", note.id, note.title);
                }
            }
            NoteSubcommands::Ls(args) => {
                let (field, range) = parse_listing(&args)?;
                let notes = app.list_notes(field, &range)?;
                if args.json {
                    print_json(&notes)?;
                } else {
                    printer.note_list(&notes);
                }
            }
            NoteSubcommands::Show(args) => {
                let view = app.show_note(args.id)?;
                if args.json {
                    print_json(&view)?;
                } else {
                    printer.note_detail(&view);
                }
            }
            NoteSubcommands::Edit(args) => {
                let note = app.edit_note(
                    args.id,
                    NotePatch {
                        title: args.title,
                        subtitle: args.subtitle,
                        description: args.desc,
                    },
                )?;
                println!("updated note {} {}", note.id, note.title);
            }
            NoteSubcommands::Rm(args) => {
                app.delete_note(args.id)?;
                println!("removed note {}", args.id);
            }
        },
        Commands::Item(args) => match args.command {
            ItemSubcommands::Add(args) => {
                let state = args
                    .state
                    .as_deref()
                    .map(CheckState::from_str)
                    .transpose()?;
                let item = app.add_item(
                    args.note,
                    &args.name,
                    args.field.as_deref(),
                    args.desc.as_deref(),
                    state,
                )?;
                if args.json {
                    print_json(&item)?;
                } else {
                    println!("added item {} {} to note {}", item.id, item.name, item.parent_id);
                }
            }
            ItemSubcommands::Edit(args) => {
                let item = app.edit_item(
                    args.id,
                    NoteItemPatch {
                        name: args.name,
                        field: args.field,
                        description: args.desc,
                        state: None,
                    },
                )?;
                println!("updated item {} {}", item.id, item.name);
            }
            ItemSubcommands::Check(args) => {
                let item = app.toggle_item(args.id)?;
                println!("item {} is now {}", item.id, item.state);
            }
            ItemSubcommands::State(args) => {
                let state = CheckState::from_str(&args.state)?;
                let item = app.set_item_state(args.id, state)?;
                println!("item {} is now {}", item.id, item.state);
            }
            ItemSubcommands::Rm(args) => {
                app.delete_item(args.id)?;
                println!("removed item {}", args.id);
            }
        },
        Commands::Status(args) => {
            let status = app.status(&cli.db)?;
            if args.json {
                print_json(&status)?;
            } else {
                printer.status(&status);
            }
        }
        Commands::Completions(_) => unreachable!("handled before opening the store"),
    }

    Ok(())
}
