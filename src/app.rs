use std::error::Error;
use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::board::CounterBoard;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigError};
use crate::domain::time_field::{parse_instant, Bound};
use crate::domain::{
    CheckState, Counter, InvalidTimeRange, Note, NoteItem, NoteItemPatch, NotePatch,
    ParseCheckStateError, ParseTimeFieldError, Tick, TimeField, TimeRange,
};
use crate::repository::{Repository, StoreError};
use crate::stats::CounterStats;

pub struct App {
    repo: Repository,
    clock: Box<dyn Clock>,
    config: Config,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CounterDetail {
    pub counter: Counter,
    pub stats: CounterStats,
    pub recent_ticks: Vec<Tick>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CounterTotal {
    pub id: i64,
    pub name: String,
    pub sum: f64,
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Totals {
    pub field: String,
    pub sum: f64,
    pub average: Option<f64>,
    pub counters: Vec<CounterTotal>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NoteView {
    pub note: Note,
    pub state: CheckState,
    pub items: Vec<NoteItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NoteSummary {
    pub note: Note,
    pub state: CheckState,
    pub item_count: usize,
    pub checked_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoreStatus {
    pub db_path: String,
    pub schema_version: Option<String>,
    pub counters: usize,
    pub ticks: usize,
    pub notes: usize,
}

const RECENT_TICKS: usize = 10;

impl App {
    pub fn open(db_path: &str, config: Config) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let repo = Repository::open(db_path)?;
        Ok(Self::with_parts(repo, Box::new(SystemClock), config))
    }

    pub fn with_parts(repo: Repository, clock: Box<dyn Clock>, config: Config) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn status(&self, db_path: &str) -> Result<StoreStatus, AppError> {
        let all = TimeRange::ALL;
        Ok(StoreStatus {
            db_path: db_path.to_string(),
            schema_version: self.repo.schema_version()?,
            counters: self.repo.counters(TimeField::Created, &all)?.len(),
            ticks: self.repo.ticks(None, TimeField::Created, &all)?.len(),
            notes: self.repo.notes(TimeField::Created, &all)?.len(),
        })
    }

    pub fn create_counter(&self, name: &str) -> Result<Counter, AppError> {
        Ok(self.repo.create_counter(name, self.now())?)
    }

    pub fn rename_counter(&self, reference: &str, name: &str) -> Result<Counter, AppError> {
        let counter = self.resolve_counter(reference)?;
        self.repo
            .rename_counter(counter.id, name, self.now())?
            .ok_or_else(|| AppError::not_found("counter", reference))
    }

    pub fn delete_counter(&self, reference: &str) -> Result<Counter, AppError> {
        let counter = self.resolve_counter(reference)?;
        if !self.repo.delete_counter(counter.id)? {
            return Err(AppError::not_found("counter", reference));
        }
        Ok(counter)
    }

    pub fn show_counter(&self, reference: &str, range: &TimeRange) -> Result<CounterDetail, AppError> {
        let counter = self.resolve_counter(reference)?;
        let ticks = self
            .repo
            .ticks(Some(counter.id), TimeField::ForData, range)?;
        let stats = CounterStats::from_ticks(&ticks);
        let recent_ticks = ticks.into_iter().take(RECENT_TICKS).collect();
        Ok(CounterDetail {
            counter,
            stats,
            recent_ticks,
        })
    }

    pub fn list_counters(
        &self,
        field: Option<TimeField>,
        range: &TimeRange,
    ) -> Result<Vec<Counter>, AppError> {
        let field = field.unwrap_or(self.config.counter_field);
        Ok(self.repo.counters(field, range)?)
    }

    /// Accepts a numeric id or an exact (case-insensitive) counter name.
    pub fn resolve_counter(&self, reference: &str) -> Result<Counter, AppError> {
        let trimmed = reference.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            if let Some(counter) = self.repo.counter(id)? {
                return Ok(counter);
            }
        }

        let mut matches: Vec<Counter> = self
            .repo
            .counters(TimeField::Created, &TimeRange::ALL)?
            .into_iter()
            .filter(|counter| counter.name.eq_ignore_ascii_case(trimmed))
            .collect();
        match matches.len() {
            0 => Err(AppError::not_found("counter", reference)),
            1 => Ok(matches.remove(0)),
            n => Err(AppError::InvalidArgument(format!(
                "'{trimmed}' matches {n} counters; use the numeric id"
            ))),
        }
    }

    pub fn add_tick(
        &self,
        reference: &str,
        amount: f64,
        at: Option<OffsetDateTime>,
    ) -> Result<Tick, AppError> {
        let counter = self.resolve_counter(reference)?;
        Ok(self.repo.add_tick(counter.id, amount, at, self.now())?)
    }

    pub fn edit_tick(
        &self,
        id: i64,
        amount: Option<f64>,
        at: Option<OffsetDateTime>,
    ) -> Result<Tick, AppError> {
        if amount.is_none() && at.is_none() {
            return Err(AppError::InvalidArgument(
                "tick edit requires --amount or --at".to_string(),
            ));
        }
        self.repo
            .update_tick(id, amount, at, self.now())?
            .ok_or_else(|| AppError::not_found("tick", id))
    }

    pub fn delete_tick(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_tick(id)? {
            return Err(AppError::not_found("tick", id));
        }
        Ok(())
    }

    pub fn list_ticks(
        &self,
        reference: Option<&str>,
        field: Option<TimeField>,
        range: &TimeRange,
    ) -> Result<Vec<Tick>, AppError> {
        let parent_id = match reference {
            Some(reference) => Some(self.resolve_counter(reference)?.id),
            None => None,
        };
        let field = field.unwrap_or(self.config.tick_field);
        Ok(self.repo.ticks(parent_id, field, range)?)
    }

    pub fn totals(&self, field: Option<TimeField>, range: &TimeRange) -> Result<Totals, AppError> {
        let field = field.unwrap_or(self.config.tick_field);
        let sums = self.repo.sums_by_counter(field, range)?;
        let averages = self.repo.averages_by_counter(field, range)?;
        let mut counters = Vec::new();
        for counter in self.repo.counters(TimeField::Created, &TimeRange::ALL)? {
            counters.push(CounterTotal {
                sum: sums.get(&counter.id).copied().unwrap_or(0.0),
                average: averages.get(&counter.id).copied(),
                id: counter.id,
                name: counter.name,
            });
        }
        counters.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(Totals {
            field: field.as_str().to_string(),
            sum: self.repo.sum(None, field, range)?,
            average: self.repo.average(None, field, range)?,
            counters,
        })
    }

    pub fn board(&self, range: TimeRange) -> Result<CounterBoard<'_>, AppError> {
        let mut board = CounterBoard::new(self.repo.watch_summaries(range));
        board.refresh()?;
        Ok(board)
    }

    pub fn create_note(
        &self,
        title: &str,
        subtitle: Option<&str>,
        description: Option<&str>,
    ) -> Result<Note, AppError> {
        Ok(self.repo.create_note(
            title,
            subtitle.unwrap_or_default(),
            description.unwrap_or_default(),
            self.now(),
        )?)
    }

    pub fn edit_note(&self, id: i64, patch: NotePatch) -> Result<Note, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "note edit requires at least one field change".to_string(),
            ));
        }
        self.repo
            .update_note(id, patch, self.now())?
            .ok_or_else(|| AppError::not_found("note", id))
    }

    pub fn delete_note(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_note(id)? {
            return Err(AppError::not_found("note", id));
        }
        Ok(())
    }

    pub fn show_note(&self, id: i64) -> Result<NoteView, AppError> {
        let note = self
            .repo
            .note(id)?
            .ok_or_else(|| AppError::not_found("note", id))?;
        let items = self.repo.note_items(id)?;
        Ok(NoteView {
            state: CheckState::summarize(items.iter().map(|item| item.state)),
            note,
            items,
        })
    }

    pub fn list_notes(
        &self,
        field: Option<TimeField>,
        range: &TimeRange,
    ) -> Result<Vec<NoteSummary>, AppError> {
        let field = field.unwrap_or(self.config.counter_field);
        let notes = self.repo.notes(field, range)?;
        let mut result = Vec::with_capacity(notes.len());
        for note in notes {
            let items = self.repo.note_items(note.id)?;
            result.push(NoteSummary {
                state: CheckState::summarize(items.iter().map(|item| item.state)),
                item_count: items.len(),
                checked_count: items.iter().filter(|item| item.state.is_checked()).count(),
                note,
            });
        }
        Ok(result)
    }

    pub fn add_item(
        &self,
        note_id: i64,
        name: &str,
        field: Option<&str>,
        description: Option<&str>,
        state: Option<CheckState>,
    ) -> Result<NoteItem, AppError> {
        Ok(self.repo.add_note_item(
            note_id,
            name,
            field.unwrap_or_default(),
            description.unwrap_or_default(),
            state.unwrap_or_default(),
            self.now(),
        )?)
    }

    pub fn edit_item(&self, id: i64, patch: NoteItemPatch) -> Result<NoteItem, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "item edit requires at least one field change".to_string(),
            ));
        }
        self.repo
            .update_note_item(id, patch, self.now())?
            .ok_or_else(|| AppError::not_found("item", id))
    }

    pub fn toggle_item(&self, id: i64) -> Result<NoteItem, AppError> {
        let item = self
            .repo
            .note_item(id)?
            .ok_or_else(|| AppError::not_found("item", id))?;
        self.set_item_state(id, item.state.toggle())
    }

    pub fn set_item_state(&self, id: i64, state: CheckState) -> Result<NoteItem, AppError> {
        self.repo
            .set_note_item_state(id, state, self.now())?
            .ok_or_else(|| AppError::not_found("item", id))
    }

    pub fn delete_item(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_note_item(id)? {
            return Err(AppError::not_found("item", id));
        }
        Ok(())
    }
}

/// Builds an inclusive range from optional `--since` / `--until` text.
pub fn parse_range(since: Option<&str>, until: Option<&str>) -> Result<TimeRange, AppError> {
    let start = since.map(|raw| parse_bound(raw, Bound::Start)).transpose()?;
    let end = until.map(|raw| parse_bound(raw, Bound::End)).transpose()?;
    Ok(TimeRange::new(start, end)?)
}

pub fn parse_time(raw: &str) -> Result<OffsetDateTime, AppError> {
    parse_bound(raw, Bound::Start)
}

fn parse_bound(raw: &str, bound: Bound) -> Result<OffsetDateTime, AppError> {
    parse_instant(raw, bound).ok_or_else(|| {
        AppError::InvalidArgument(format!(
            "invalid time '{raw}': expected RFC 3339 or YYYY-MM-DD"
        ))
    })
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Store(StoreError),
    Config(ConfigError),
    ParseTimeField(ParseTimeFieldError),
    ParseCheckState(ParseCheckStateError),
    InvalidRange(InvalidTimeRange),
    InvalidArgument(String),
    NotFound { kind: &'static str, id: String },
}

impl AppError {
    fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        AppError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::ParseTimeField(err) => write!(f, "{}", err),
            AppError::ParseCheckState(err) => write!(f, "{}", err),
            AppError::InvalidRange(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound { kind, id } => write!(f, "{} '{}' not found", kind, id),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::ParseTimeField(err) => Some(err),
            AppError::ParseCheckState(err) => Some(err),
            AppError::InvalidRange(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound { .. } => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<ParseTimeFieldError> for AppError {
    fn from(value: ParseTimeFieldError) -> Self {
        AppError::ParseTimeField(value)
    }
}

impl From<ParseCheckStateError> for AppError {
    fn from(value: ParseCheckStateError) -> Self {
        AppError::ParseCheckState(value)
    }
}

impl From<InvalidTimeRange> for AppError {
    fn from(value: InvalidTimeRange) -> Self {
        AppError::InvalidRange(value)
    }
}
