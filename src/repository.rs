use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::db::{self, CounterRecord, NoteItemRecord, NoteRecord, TickRecord};
use crate::domain::time_field::{from_millis, to_millis};
use crate::domain::{
    CheckState, Counter, Note, NoteItem, NoteItemPatch, NotePatch, Tick, TimeField, TimeRange,
};
use crate::feed::{ChangeFeed, ChangeKind, Flow, Table};
use crate::ids;
use crate::stats::CounterStats;

/// Translates rows to domain models and publishes every committed write.
pub struct Repository {
    conn: Connection,
    feed: ChangeFeed,
}

pub type StoreFlow<'r, T> = Flow<'r, T, StoreError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterSummary {
    pub counter: Counter,
    pub stats: CounterStats,
}

impl Repository {
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = db::open_connection(db_path)?;
        Ok(Self::with_connection(conn))
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::with_connection(db::open_in_memory()?))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            feed: ChangeFeed::new(),
        }
    }

    pub fn schema_version(&self) -> Result<Option<String>, StoreError> {
        Ok(db::get_meta(&self.conn, "schema_version")?)
    }

    pub fn create_counter(&self, name: &str, now: OffsetDateTime) -> Result<Counter, StoreError> {
        let name = required_text("counter name", name)?;
        let stamp = to_millis(now);

        let tx = self.conn.unchecked_transaction()?;
        let id = allocate_id(&tx, Table::Counter, db::counter_exists)?;
        let record = CounterRecord {
            id,
            name,
            time_created: stamp,
            time_modified: stamp,
        };
        db::insert_counter(&tx, &record)?;
        tx.commit()?;

        tracing::debug!(id, "created counter");
        self.feed.emit(Table::Counter, ChangeKind::Inserted, id);
        Ok(counter_from_record(record))
    }

    pub fn rename_counter(
        &self,
        id: i64,
        name: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Counter>, StoreError> {
        let name = required_text("counter name", name)?;
        let Some(mut record) = db::get_counter(&self.conn, id)? else {
            return Ok(None);
        };
        record.name = name;
        record.time_modified = to_millis(now).max(record.time_created);
        if !db::update_counter(&self.conn, &record)? {
            return Ok(None);
        }

        tracing::debug!(id, "renamed counter");
        self.feed.emit(Table::Counter, ChangeKind::Updated, id);
        Ok(Some(counter_from_record(record)))
    }

    /// Ticks go with their counter through the cascade.
    pub fn delete_counter(&self, id: i64) -> Result<bool, StoreError> {
        let deleted = db::delete_counter(&self.conn, id)?;
        if deleted {
            tracing::debug!(id, "deleted counter");
            self.feed.emit(Table::Counter, ChangeKind::Deleted, id);
        }
        Ok(deleted)
    }

    pub fn counter(&self, id: i64) -> Result<Option<Counter>, StoreError> {
        Ok(db::get_counter(&self.conn, id)?.map(counter_from_record))
    }

    pub fn counters(
        &self,
        field: TimeField,
        range: &TimeRange,
    ) -> Result<Vec<Counter>, StoreError> {
        require_parent_field(field)?;
        Ok(db::list_counters(&self.conn, field, range)?
            .into_iter()
            .map(counter_from_record)
            .collect())
    }

    pub fn add_tick(
        &self,
        parent_id: i64,
        amount: f64,
        time_for_data: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Result<Tick, StoreError> {
        require_finite(amount)?;
        let stamp = to_millis(now);

        let tx = self.conn.unchecked_transaction()?;
        if !db::counter_exists(&tx, parent_id)? {
            return Err(StoreError::ParentMissing {
                table: Table::Counter,
                id: parent_id,
            });
        }
        let id = allocate_id(&tx, Table::Tick, db::tick_exists)?;
        let record = TickRecord {
            id,
            parent_id,
            amount,
            time_created: stamp,
            time_modified: stamp,
            time_for_data: time_for_data.map_or(stamp, to_millis),
        };
        db::insert_tick(&tx, &record)?;
        tx.commit()?;

        tracing::debug!(id, parent_id, amount, "added tick");
        self.feed.emit(Table::Tick, ChangeKind::Inserted, id);
        Ok(tick_from_record(record))
    }

    pub fn update_tick(
        &self,
        id: i64,
        amount: Option<f64>,
        time_for_data: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Result<Option<Tick>, StoreError> {
        if let Some(amount) = amount {
            require_finite(amount)?;
        }
        let Some(mut record) = db::get_tick(&self.conn, id)? else {
            return Ok(None);
        };
        if let Some(amount) = amount {
            record.amount = amount;
        }
        if let Some(ts) = time_for_data {
            record.time_for_data = to_millis(ts);
        }
        record.time_modified = to_millis(now).max(record.time_created);
        if !db::update_tick(&self.conn, &record)? {
            return Ok(None);
        }

        tracing::debug!(id, "updated tick");
        self.feed.emit(Table::Tick, ChangeKind::Updated, id);
        Ok(Some(tick_from_record(record)))
    }

    pub fn delete_tick(&self, id: i64) -> Result<bool, StoreError> {
        let deleted = db::delete_tick(&self.conn, id)?;
        if deleted {
            tracing::debug!(id, "deleted tick");
            self.feed.emit(Table::Tick, ChangeKind::Deleted, id);
        }
        Ok(deleted)
    }

    pub fn tick(&self, id: i64) -> Result<Option<Tick>, StoreError> {
        Ok(db::get_tick(&self.conn, id)?.map(tick_from_record))
    }

    pub fn ticks(
        &self,
        parent_id: Option<i64>,
        field: TimeField,
        range: &TimeRange,
    ) -> Result<Vec<Tick>, StoreError> {
        Ok(db::list_ticks(&self.conn, parent_id, field, range)?
            .into_iter()
            .map(tick_from_record)
            .collect())
    }

    /// Zero when nothing matches.
    pub fn sum(
        &self,
        parent_id: Option<i64>,
        field: TimeField,
        range: &TimeRange,
    ) -> Result<f64, StoreError> {
        Ok(db::sum_ticks(&self.conn, parent_id, field, range)?.unwrap_or(0.0))
    }

    pub fn average(
        &self,
        parent_id: Option<i64>,
        field: TimeField,
        range: &TimeRange,
    ) -> Result<Option<f64>, StoreError> {
        Ok(db::average_ticks(&self.conn, parent_id, field, range)?)
    }

    pub fn sums_by_counter(
        &self,
        field: TimeField,
        range: &TimeRange,
    ) -> Result<BTreeMap<i64, f64>, StoreError> {
        Ok(db::sum_ticks_by_parent(&self.conn, field, range)?
            .into_iter()
            .collect())
    }

    pub fn averages_by_counter(
        &self,
        field: TimeField,
        range: &TimeRange,
    ) -> Result<BTreeMap<i64, f64>, StoreError> {
        Ok(db::average_ticks_by_parent(&self.conn, field, range)?
            .into_iter()
            .collect())
    }

    /// Every counter with stats over its ticks whose data time is in `range`.
    pub fn summaries(&self, range: &TimeRange) -> Result<Vec<CounterSummary>, StoreError> {
        let counters = self.counters(TimeField::Modified, &TimeRange::ALL)?;
        let mut result = Vec::with_capacity(counters.len());
        for counter in counters {
            let ticks = self.ticks(Some(counter.id), TimeField::ForData, range)?;
            result.push(CounterSummary {
                stats: CounterStats::from_ticks(&ticks),
                counter,
            });
        }
        Ok(result)
    }

    pub fn create_note(
        &self,
        title: &str,
        subtitle: &str,
        description: &str,
        now: OffsetDateTime,
    ) -> Result<Note, StoreError> {
        let title = required_text("note title", title)?;
        let stamp = to_millis(now);

        let tx = self.conn.unchecked_transaction()?;
        let id = allocate_id(&tx, Table::Note, db::note_exists)?;
        let record = NoteRecord {
            id,
            title,
            subtitle: subtitle.trim().to_string(),
            description: description.trim().to_string(),
            time_created: stamp,
            time_modified: stamp,
        };
        db::insert_note(&tx, &record)?;
        tx.commit()?;

        tracing::debug!(id, "created note");
        self.feed.emit(Table::Note, ChangeKind::Inserted, id);
        Ok(note_from_record(record))
    }

    pub fn update_note(
        &self,
        id: i64,
        patch: NotePatch,
        now: OffsetDateTime,
    ) -> Result<Option<Note>, StoreError> {
        let Some(mut record) = db::get_note(&self.conn, id)? else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            record.title = required_text("note title", &title)?;
        }
        if let Some(subtitle) = patch.subtitle {
            record.subtitle = subtitle.trim().to_string();
        }
        if let Some(description) = patch.description {
            record.description = description.trim().to_string();
        }
        record.time_modified = to_millis(now).max(record.time_created);
        if !db::update_note(&self.conn, &record)? {
            return Ok(None);
        }

        tracing::debug!(id, "updated note");
        self.feed.emit(Table::Note, ChangeKind::Updated, id);
        Ok(Some(note_from_record(record)))
    }

    pub fn delete_note(&self, id: i64) -> Result<bool, StoreError> {
        let deleted = db::delete_note(&self.conn, id)?;
        if deleted {
            tracing::debug!(id, "deleted note");
            self.feed.emit(Table::Note, ChangeKind::Deleted, id);
        }
        Ok(deleted)
    }

    pub fn note(&self, id: i64) -> Result<Option<Note>, StoreError> {
        Ok(db::get_note(&self.conn, id)?.map(note_from_record))
    }

    pub fn notes(&self, field: TimeField, range: &TimeRange) -> Result<Vec<Note>, StoreError> {
        require_parent_field(field)?;
        Ok(db::list_notes(&self.conn, field, range)?
            .into_iter()
            .map(note_from_record)
            .collect())
    }

    pub fn add_note_item(
        &self,
        parent_id: i64,
        name: &str,
        field: &str,
        description: &str,
        state: CheckState,
        now: OffsetDateTime,
    ) -> Result<NoteItem, StoreError> {
        let name = required_text("item name", name)?;
        let stamp = to_millis(now);

        let tx = self.conn.unchecked_transaction()?;
        if !db::note_exists(&tx, parent_id)? {
            return Err(StoreError::ParentMissing {
                table: Table::Note,
                id: parent_id,
            });
        }
        let id = allocate_id(&tx, Table::NoteItem, db::note_item_exists)?;
        let record = NoteItemRecord {
            id,
            parent_id,
            name,
            field: field.trim().to_string(),
            description: description.trim().to_string(),
            state: state.as_str().to_string(),
            time_created: stamp,
            time_modified: stamp,
        };
        db::insert_note_item(&tx, &record)?;
        tx.commit()?;

        tracing::debug!(id, parent_id, "added note item");
        self.feed.emit(Table::NoteItem, ChangeKind::Inserted, id);
        Ok(note_item_from_record(record))
    }

    pub fn update_note_item(
        &self,
        id: i64,
        patch: NoteItemPatch,
        now: OffsetDateTime,
    ) -> Result<Option<NoteItem>, StoreError> {
        let Some(mut record) = db::get_note_item(&self.conn, id)? else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            record.name = required_text("item name", &name)?;
        }
        if let Some(field) = patch.field {
            record.field = field.trim().to_string();
        }
        if let Some(description) = patch.description {
            record.description = description.trim().to_string();
        }
        if let Some(state) = patch.state {
            record.state = state.as_str().to_string();
        }
        record.time_modified = to_millis(now).max(record.time_created);
        if !db::update_note_item(&self.conn, &record)? {
            return Ok(None);
        }

        tracing::debug!(id, state = %record.state, "updated note item");
        self.feed.emit(Table::NoteItem, ChangeKind::Updated, id);
        Ok(Some(note_item_from_record(record)))
    }

    pub fn set_note_item_state(
        &self,
        id: i64,
        state: CheckState,
        now: OffsetDateTime,
    ) -> Result<Option<NoteItem>, StoreError> {
        self.update_note_item(
            id,
            NoteItemPatch {
                state: Some(state),
                ..NoteItemPatch::default()
            },
            now,
        )
    }

    pub fn delete_note_item(&self, id: i64) -> Result<bool, StoreError> {
        let deleted = db::delete_note_item(&self.conn, id)?;
        if deleted {
            tracing::debug!(id, "deleted note item");
            self.feed.emit(Table::NoteItem, ChangeKind::Deleted, id);
        }
        Ok(deleted)
    }

    pub fn note_item(&self, id: i64) -> Result<Option<NoteItem>, StoreError> {
        Ok(db::get_note_item(&self.conn, id)?.map(note_item_from_record))
    }

    pub fn note_items(&self, parent_id: i64) -> Result<Vec<NoteItem>, StoreError> {
        Ok(db::list_note_items(&self.conn, parent_id)?
            .into_iter()
            .map(note_item_from_record)
            .collect())
    }

    pub fn watch_counters(
        &self,
        field: TimeField,
        range: TimeRange,
    ) -> Result<StoreFlow<'_, Vec<Counter>>, StoreError> {
        require_parent_field(field)?;
        Ok(Flow::new(self.feed.subscribe(), &[Table::Counter], move || {
            self.counters(field, &range)
        }))
    }

    pub fn watch_ticks(
        &self,
        parent_id: Option<i64>,
        field: TimeField,
        range: TimeRange,
    ) -> StoreFlow<'_, Vec<Tick>> {
        Flow::new(
            self.feed.subscribe(),
            &[Table::Tick, Table::Counter],
            move || self.ticks(parent_id, field, &range),
        )
    }

    pub fn watch_sum(
        &self,
        parent_id: Option<i64>,
        field: TimeField,
        range: TimeRange,
    ) -> StoreFlow<'_, f64> {
        Flow::new(
            self.feed.subscribe(),
            &[Table::Tick, Table::Counter],
            move || self.sum(parent_id, field, &range),
        )
    }

    pub fn watch_summaries(&self, range: TimeRange) -> StoreFlow<'_, Vec<CounterSummary>> {
        Flow::new(
            self.feed.subscribe(),
            &[Table::Counter, Table::Tick],
            move || self.summaries(&range),
        )
    }

    pub fn watch_notes(
        &self,
        field: TimeField,
    ) -> Result<StoreFlow<'_, Vec<Note>>, StoreError> {
        require_parent_field(field)?;
        Ok(Flow::new(self.feed.subscribe(), &[Table::Note], move || {
            self.notes(field, &TimeRange::ALL)
        }))
    }

    pub fn watch_note_items(&self, parent_id: i64) -> StoreFlow<'_, Vec<NoteItem>> {
        Flow::new(
            self.feed.subscribe(),
            &[Table::NoteItem, Table::Note],
            move || self.note_items(parent_id),
        )
    }
}

fn allocate_id(
    conn: &Connection,
    table: Table,
    exists: fn(&Connection, i64) -> rusqlite::Result<bool>,
) -> Result<i64, StoreError> {
    let mut failure = None;
    let id = ids::generate_id(|candidate| match exists(conn, candidate) {
        Ok(found) => found,
        Err(err) => {
            failure.get_or_insert(err);
            true
        }
    });
    if let Some(err) = failure {
        return Err(StoreError::Db(err));
    }
    id.ok_or(StoreError::IdSpaceExhausted(table))
}

fn required_text(label: &str, raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn require_finite(amount: f64) -> Result<(), StoreError> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidArgument(format!(
            "tick amount must be a finite number, got {amount}"
        )))
    }
}

fn require_parent_field(field: TimeField) -> Result<(), StoreError> {
    if field.applies_to_parents() {
        Ok(())
    } else {
        Err(StoreError::InvalidArgument(format!(
            "time field '{field}' only applies to ticks"
        )))
    }
}

fn counter_from_record(record: CounterRecord) -> Counter {
    Counter {
        id: record.id,
        name: record.name,
        time_created: from_millis(record.time_created),
        time_modified: from_millis(record.time_modified),
    }
}

fn tick_from_record(record: TickRecord) -> Tick {
    Tick {
        id: record.id,
        parent_id: record.parent_id,
        amount: record.amount,
        time_created: from_millis(record.time_created),
        time_modified: from_millis(record.time_modified),
        time_for_data: from_millis(record.time_for_data),
    }
}

fn note_from_record(record: NoteRecord) -> Note {
    Note {
        id: record.id,
        title: record.title,
        subtitle: record.subtitle,
        description: record.description,
        time_created: from_millis(record.time_created),
        time_modified: from_millis(record.time_modified),
    }
}

fn note_item_from_record(record: NoteItemRecord) -> NoteItem {
    let state = CheckState::from_str(&record.state).unwrap_or_else(|err| {
        tracing::warn!(id = record.id, %err, "unreadable item state, using default");
        CheckState::Default
    });
    NoteItem {
        id: record.id,
        parent_id: record.parent_id,
        name: record.name,
        field: record.field,
        description: record.description,
        state,
        time_created: from_millis(record.time_created),
        time_modified: from_millis(record.time_modified),
    }
}

#[derive(Debug)]
pub enum StoreError {
    Db(rusqlite::Error),
    IdSpaceExhausted(Table),
    ParentMissing { table: Table, id: i64 },
    InvalidArgument(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(err) => write!(f, "database error: {}", err),
            StoreError::IdSpaceExhausted(table) => {
                write!(f, "could not allocate a free {} id", table_label(*table))
            }
            StoreError::ParentMissing { table, id } => {
                write!(f, "{} '{}' does not exist", table_label(*table), id)
            }
            StoreError::InvalidArgument(message) => write!(f, "{}", message),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}

pub fn table_label(table: Table) -> &'static str {
    match table {
        Table::Counter => "counter",
        Table::Tick => "tick",
        Table::Note => "note",
        Table::NoteItem => "note item",
    }
}

#[cfg(test)]
mod tests;
