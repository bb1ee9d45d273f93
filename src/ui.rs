use std::io::{self, IsTerminal};

use time::OffsetDateTime;

use crate::app::{CounterDetail, NoteSummary, NoteView, StoreStatus, Totals};
use crate::board::CounterBoard;
use crate::config::Config;
use crate::datetime_format::{format_relative, DateTimeFormat};
use crate::domain::{CheckState, Counter, Tick, TimeRange};

/// Human-readable output for every command; `--json` bypasses it.
pub struct Printer {
    palette: Palette,
    format: DateTimeFormat,
    relative: bool,
    now: OffsetDateTime,
}

impl Printer {
    pub fn new(config: &Config, now: OffsetDateTime) -> Self {
        Self {
            palette: Palette::auto(),
            format: config.datetime,
            relative: config.relative_times,
            now,
        }
    }

    fn time(&self, ts: OffsetDateTime) -> String {
        if self.relative {
            format_relative(ts, self.now)
        } else {
            self.format.format(ts)
        }
    }

    pub fn counter_list(&self, counters: &[Counter], range: &TimeRange) {
        let palette = &self.palette;
        println!("{}", palette.heading("Counters"));
        if let Some(summary) = range_summary(range, &self.format) {
            println!("{}", palette.dim(&format!("range: {summary}")));
        }
        if counters.is_empty() {
            println!("{}", palette.dim("no counters matched"));
            return;
        }
        for counter in counters {
            println!("{}", self.counter_row(counter));
        }
        println!("{}", palette.dim(&format!("{} counter(s)", counters.len())));
    }

    fn counter_row(&self, counter: &Counter) -> String {
        format!(
            "{} {} {}",
            self.palette.id(&counter.id.to_string()),
            counter.name,
            self.palette.dim(&format!("modified {}", self.time(counter.time_modified)))
        )
    }

    pub fn counter_detail(&self, detail: &CounterDetail) {
        let palette = &self.palette;
        println!("{}", self.counter_row(&detail.counter));
        println!("created:  {}", self.time(detail.counter.time_created));
        let stats = &detail.stats;
        println!("ticks:    {}", stats.count);
        println!("total:    {}", palette.amount(stats.total));
        if let Some(average) = stats.average {
            println!("average:  {}", format_amount(average));
        }
        if let (Some(lo), Some(hi)) = (stats.min_amount, stats.max_amount) {
            println!("range:    {} .. {}", format_amount(lo), format_amount(hi));
        }
        if let (Some(first), Some(last)) = (stats.first, stats.last) {
            println!("span:     {} .. {}", self.time(first), self.time(last));
        }
        if !detail.recent_ticks.is_empty() {
            println!("{}", palette.heading("Recent ticks"));
            for tick in &detail.recent_ticks {
                println!("{}", self.tick_row(tick));
            }
        }
    }

    pub fn tick_list(&self, ticks: &[Tick], range: &TimeRange) {
        let palette = &self.palette;
        println!("{}", palette.heading("Ticks"));
        if let Some(summary) = range_summary(range, &self.format) {
            println!("{}", palette.dim(&format!("range: {summary}")));
        }
        if ticks.is_empty() {
            println!("{}", palette.dim("no ticks matched"));
            return;
        }
        for tick in ticks {
            println!("{}", self.tick_row(tick));
        }
        println!("{}", palette.dim(&format!("{} tick(s)", ticks.len())));
    }

    fn tick_row(&self, tick: &Tick) -> String {
        format!(
            "{} {} {}",
            self.palette.id(&tick.id.to_string()),
            self.palette.amount(tick.amount),
            self.time(tick.time_for_data)
        )
    }

    pub fn totals(&self, totals: &Totals) {
        let palette = &self.palette;
        println!(
            "{}",
            palette.heading(&format!("Totals by {}", totals.field))
        );
        for row in &totals.counters {
            let average = row.average.map(format_amount).unwrap_or_else(|| "-".to_string());
            println!(
                "{} {} {} {}",
                palette.id(&row.id.to_string()),
                row.name,
                palette.amount(row.sum),
                palette.dim(&format!("avg {average}"))
            );
        }
        println!("total: {}", palette.amount(totals.sum));
    }

    pub fn board(&self, board: &CounterBoard<'_>) {
        let palette = &self.palette;
        println!("{}", palette.heading("Board"));
        if board.is_empty() {
            println!("{}", palette.dim("no counters yet"));
            return;
        }
        for summary in board.rows() {
            let last = summary
                .stats
                .last
                .map(|ts| self.time(ts))
                .unwrap_or_else(|| "never".to_string());
            println!(
                "{} {} {} {}",
                palette.id(&summary.counter.id.to_string()),
                summary.counter.name,
                palette.amount(summary.stats.total),
                palette.dim(&format!("{} tick(s), last {last}", summary.stats.count))
            );
        }
        println!("total: {}", palette.amount(board.grand_total()));
    }

    pub fn note_list(&self, notes: &[NoteSummary]) {
        let palette = &self.palette;
        println!("{}", palette.heading("Notes"));
        if notes.is_empty() {
            println!("{}", palette.dim("no notes matched"));
            return;
        }
        for row in notes {
            let mut line = format!(
                "{} {} {}",
                palette.id(&row.note.id.to_string()),
                palette.state(row.state),
                row.note.title
            );
            if !row.note.subtitle.is_empty() {
                line.push(' ');
                line.push_str(&palette.dim(&format!("({})", row.note.subtitle)));
            }
            if row.item_count > 0 {
                line.push(' ');
                line.push_str(
                    &palette.dim(&format!("{}/{} done", row.checked_count, row.item_count)),
                );
            }
            println!("{line}");
        }
        println!("{}", palette.dim(&format!("{} note(s)", notes.len())));
    }

    pub fn note_detail(&self, view: &NoteView) {
        let palette = &self.palette;
        let note = &view.note;
        println!(
            "{} {} {}",
            palette.id(&note.id.to_string()),
            palette.state(view.state),
            palette.heading(&note.title)
        );
        if !note.subtitle.is_empty() {
            println!("{}", note.subtitle);
        }
        if !note.description.is_empty() {
            println!();
            println!("{}", note.description);
        }
        println!(
            "{}",
            palette.dim(&format!("modified {}", self.time(note.time_modified)))
        );
        for item in &view.items {
            let mut line = format!(
                "  {} {} {}",
                checkbox(item.state),
                palette.id(&item.id.to_string()),
                item.name
            );
            if !item.field.is_empty() {
                line.push(' ');
                line.push_str(&palette.dim(&format!("[{}]", item.field)));
            }
            println!("{line}");
            if !item.description.is_empty() {
                println!("      {}", palette.dim(&item.description));
            }
        }
    }

    pub fn status(&self, status: &StoreStatus) {
        println!("db:       {}", status.db_path);
        println!(
            "schema:   {}",
            status.schema_version.as_deref().unwrap_or("unknown")
        );
        println!("counters: {}", status.counters);
        println!("ticks:    {}", status.ticks);
        println!("notes:    {}", status.notes);
    }
}

fn checkbox(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Partial => "[-]",
        CheckState::Unchecked | CheckState::Default => "[ ]",
        CheckState::None => "   ",
    }
}

fn range_summary(range: &TimeRange, format: &DateTimeFormat) -> Option<String> {
    if range.is_unbounded() {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(start) = range.start {
        parts.push(format!("since={}", format.format(start)));
    }
    if let Some(end) = range.end {
        parts.push(format!("until={}", format.format(end)));
    }
    Some(parts.join(" "))
}

/// Whole numbers print without a fractional part.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{amount:.0}")
    } else {
        let text = format!("{amount:.3}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn amount(&self, amount: f64) -> String {
        let code = if amount < 0.0 { "31" } else { "32" };
        self.paint(code, &format_amount(amount))
    }

    fn state(&self, state: CheckState) -> String {
        let upper = state.as_str().to_ascii_uppercase();
        self.paint(state_color_code(state), &format!("[{upper}]"))
    }
}

fn state_color_code(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "32",
        CheckState::Partial => "33",
        CheckState::Unchecked => "36",
        CheckState::None | CheckState::Default => "37",
    }
}
