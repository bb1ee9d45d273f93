use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};

use crate::domain::{TimeField, TimeRange};

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_counter_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS counter (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    time_created INTEGER NOT NULL,
    time_modified INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tick (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER NOT NULL REFERENCES counter(id) ON DELETE CASCADE,
    amount REAL NOT NULL,
    time_created INTEGER NOT NULL,
    time_modified INTEGER NOT NULL,
    time_for_data INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_counter_time_created ON counter(time_created);
CREATE INDEX IF NOT EXISTS idx_counter_time_modified ON counter(time_modified);
CREATE INDEX IF NOT EXISTS idx_tick_parent ON tick(parent_id);
CREATE INDEX IF NOT EXISTS idx_tick_time_for_data ON tick(time_for_data);
"#,
    },
    Migration {
        version: 2,
        name: "notes_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS note (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    subtitle TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    time_created INTEGER NOT NULL,
    time_modified INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS note_item (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER NOT NULL REFERENCES note(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    field TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    state TEXT NOT NULL DEFAULT 'default',
    time_created INTEGER NOT NULL,
    time_modified INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_note_item_parent ON note_item(parent_id);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tracing::debug!(version = migration.version, name = migration.name, "applying migration");
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.name,
                crate::domain::time_field::to_millis(time::OffsetDateTime::now_utc())
            ],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

/// Column for counters and notes, which have no data timestamp. Callers
/// reject `ForData` before reaching the store.
fn parent_time_column(field: TimeField) -> &'static str {
    match field {
        TimeField::Created => "time_created",
        TimeField::Modified | TimeField::ForData => "time_modified",
    }
}

fn tick_time_column(field: TimeField) -> &'static str {
    match field {
        TimeField::Created => "time_created",
        TimeField::Modified => "time_modified",
        TimeField::ForData => "time_for_data",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRecord {
    pub id: i64,
    pub name: String,
    pub time_created: i64,
    pub time_modified: i64,
}

impl CounterRecord {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            time_created: row.get(2)?,
            time_modified: row.get(3)?,
        })
    }
}

pub fn insert_counter(conn: &Connection, record: &CounterRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO counter (id, name, time_created, time_modified) VALUES (?1, ?2, ?3, ?4)",
        params![
            record.id,
            record.name,
            record.time_created,
            record.time_modified
        ],
    )?;
    Ok(())
}

pub fn update_counter(conn: &Connection, record: &CounterRecord) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE counter SET name = ?2, time_modified = ?3 WHERE id = ?1",
        params![record.id, record.name, record.time_modified],
    )?;
    Ok(changed > 0)
}

pub fn delete_counter(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM counter WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn counter_exists(conn: &Connection, id: i64) -> Result<bool> {
    row_exists(conn, "SELECT EXISTS(SELECT 1 FROM counter WHERE id = ?1)", id)
}

pub fn get_counter(conn: &Connection, id: i64) -> Result<Option<CounterRecord>> {
    conn.query_row(
        "SELECT id, name, time_created, time_modified FROM counter WHERE id = ?1",
        params![id],
        CounterRecord::from_row,
    )
    .optional()
}

pub fn list_counters(
    conn: &Connection,
    field: TimeField,
    range: &TimeRange,
) -> Result<Vec<CounterRecord>> {
    let column = parent_time_column(field);
    let sql = format!(
        r#"
SELECT id, name, time_created, time_modified
FROM counter
WHERE {column} BETWEEN ?1 AND ?2
ORDER BY {column} DESC, id ASC
"#
    );
    let (start, end) = range.as_millis();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![start, end])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(CounterRecord::from_row(row)?);
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub id: i64,
    pub parent_id: i64,
    pub amount: f64,
    pub time_created: i64,
    pub time_modified: i64,
    pub time_for_data: i64,
}

impl TickRecord {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            amount: row.get(2)?,
            time_created: row.get(3)?,
            time_modified: row.get(4)?,
            time_for_data: row.get(5)?,
        })
    }
}

pub fn insert_tick(conn: &Connection, record: &TickRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO tick (id, parent_id, amount, time_created, time_modified, time_for_data)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#,
        params![
            record.id,
            record.parent_id,
            record.amount,
            record.time_created,
            record.time_modified,
            record.time_for_data
        ],
    )?;
    Ok(())
}

pub fn update_tick(conn: &Connection, record: &TickRecord) -> Result<bool> {
    let changed = conn.execute(
        r#"
UPDATE tick
SET amount = ?2, time_modified = ?3, time_for_data = ?4
WHERE id = ?1
"#,
        params![
            record.id,
            record.amount,
            record.time_modified,
            record.time_for_data
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_tick(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM tick WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn tick_exists(conn: &Connection, id: i64) -> Result<bool> {
    row_exists(conn, "SELECT EXISTS(SELECT 1 FROM tick WHERE id = ?1)", id)
}

pub fn get_tick(conn: &Connection, id: i64) -> Result<Option<TickRecord>> {
    conn.query_row(
        r#"
SELECT id, parent_id, amount, time_created, time_modified, time_for_data
FROM tick
WHERE id = ?1
"#,
        params![id],
        TickRecord::from_row,
    )
    .optional()
}

pub fn list_ticks(
    conn: &Connection,
    parent_id: Option<i64>,
    field: TimeField,
    range: &TimeRange,
) -> Result<Vec<TickRecord>> {
    let column = tick_time_column(field);
    let sql = format!(
        r#"
SELECT id, parent_id, amount, time_created, time_modified, time_for_data
FROM tick
WHERE (?1 IS NULL OR parent_id = ?1)
  AND {column} BETWEEN ?2 AND ?3
ORDER BY {column} DESC, id ASC
"#
    );
    let (start, end) = range.as_millis();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![parent_id, start, end])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(TickRecord::from_row(row)?);
    }
    Ok(result)
}

pub fn sum_ticks(
    conn: &Connection,
    parent_id: Option<i64>,
    field: TimeField,
    range: &TimeRange,
) -> Result<Option<f64>> {
    aggregate_ticks(conn, "SUM", parent_id, field, range)
}

pub fn average_ticks(
    conn: &Connection,
    parent_id: Option<i64>,
    field: TimeField,
    range: &TimeRange,
) -> Result<Option<f64>> {
    aggregate_ticks(conn, "AVG", parent_id, field, range)
}

fn aggregate_ticks(
    conn: &Connection,
    function: &'static str,
    parent_id: Option<i64>,
    field: TimeField,
    range: &TimeRange,
) -> Result<Option<f64>> {
    let column = tick_time_column(field);
    let sql = format!(
        r#"
SELECT {function}(amount)
FROM tick
WHERE (?1 IS NULL OR parent_id = ?1)
  AND {column} BETWEEN ?2 AND ?3
"#
    );
    let (start, end) = range.as_millis();
    conn.query_row(&sql, params![parent_id, start, end], |row| row.get(0))
}

pub fn sum_ticks_by_parent(
    conn: &Connection,
    field: TimeField,
    range: &TimeRange,
) -> Result<Vec<(i64, f64)>> {
    aggregate_ticks_by_parent(conn, "SUM", field, range)
}

pub fn average_ticks_by_parent(
    conn: &Connection,
    field: TimeField,
    range: &TimeRange,
) -> Result<Vec<(i64, f64)>> {
    aggregate_ticks_by_parent(conn, "AVG", field, range)
}

fn aggregate_ticks_by_parent(
    conn: &Connection,
    function: &'static str,
    field: TimeField,
    range: &TimeRange,
) -> Result<Vec<(i64, f64)>> {
    let column = tick_time_column(field);
    let sql = format!(
        r#"
SELECT parent_id, {function}(amount)
FROM tick
WHERE {column} BETWEEN ?1 AND ?2
GROUP BY parent_id
ORDER BY parent_id ASC
"#
    );
    let (start, end) = range.as_millis();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![start, end])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push((row.get(0)?, row.get(1)?));
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub time_created: i64,
    pub time_modified: i64,
}

impl NoteRecord {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            subtitle: row.get(2)?,
            description: row.get(3)?,
            time_created: row.get(4)?,
            time_modified: row.get(5)?,
        })
    }
}

pub fn insert_note(conn: &Connection, record: &NoteRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO note (id, title, subtitle, description, time_created, time_modified)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#,
        params![
            record.id,
            record.title,
            record.subtitle,
            record.description,
            record.time_created,
            record.time_modified
        ],
    )?;
    Ok(())
}

pub fn update_note(conn: &Connection, record: &NoteRecord) -> Result<bool> {
    let changed = conn.execute(
        r#"
UPDATE note
SET title = ?2, subtitle = ?3, description = ?4, time_modified = ?5
WHERE id = ?1
"#,
        params![
            record.id,
            record.title,
            record.subtitle,
            record.description,
            record.time_modified
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_note(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM note WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn note_exists(conn: &Connection, id: i64) -> Result<bool> {
    row_exists(conn, "SELECT EXISTS(SELECT 1 FROM note WHERE id = ?1)", id)
}

pub fn get_note(conn: &Connection, id: i64) -> Result<Option<NoteRecord>> {
    conn.query_row(
        r#"
SELECT id, title, subtitle, description, time_created, time_modified
FROM note
WHERE id = ?1
"#,
        params![id],
        NoteRecord::from_row,
    )
    .optional()
}

pub fn list_notes(conn: &Connection, field: TimeField, range: &TimeRange) -> Result<Vec<NoteRecord>> {
    let column = parent_time_column(field);
    let sql = format!(
        r#"
SELECT id, title, subtitle, description, time_created, time_modified
FROM note
WHERE {column} BETWEEN ?1 AND ?2
ORDER BY {column} DESC, id ASC
"#
    );
    let (start, end) = range.as_millis();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![start, end])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(NoteRecord::from_row(row)?);
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItemRecord {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub field: String,
    pub description: String,
    pub state: String,
    pub time_created: i64,
    pub time_modified: i64,
}

impl NoteItemRecord {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            name: row.get(2)?,
            field: row.get(3)?,
            description: row.get(4)?,
            state: row.get(5)?,
            time_created: row.get(6)?,
            time_modified: row.get(7)?,
        })
    }
}

pub fn insert_note_item(conn: &Connection, record: &NoteItemRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO note_item (
    id, parent_id, name, field, description, state, time_created, time_modified
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
        params![
            record.id,
            record.parent_id,
            record.name,
            record.field,
            record.description,
            record.state,
            record.time_created,
            record.time_modified
        ],
    )?;
    Ok(())
}

pub fn update_note_item(conn: &Connection, record: &NoteItemRecord) -> Result<bool> {
    let changed = conn.execute(
        r#"
UPDATE note_item
SET name = ?2, field = ?3, description = ?4, state = ?5, time_modified = ?6
WHERE id = ?1
"#,
        params![
            record.id,
            record.name,
            record.field,
            record.description,
            record.state,
            record.time_modified
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_note_item(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM note_item WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn note_item_exists(conn: &Connection, id: i64) -> Result<bool> {
    row_exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM note_item WHERE id = ?1)",
        id,
    )
}

pub fn get_note_item(conn: &Connection, id: i64) -> Result<Option<NoteItemRecord>> {
    conn.query_row(
        r#"
SELECT id, parent_id, name, field, description, state, time_created, time_modified
FROM note_item
WHERE id = ?1
"#,
        params![id],
        NoteItemRecord::from_row,
    )
    .optional()
}

pub fn list_note_items(conn: &Connection, parent_id: i64) -> Result<Vec<NoteItemRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, parent_id, name, field, description, state, time_created, time_modified
FROM note_item
WHERE parent_id = ?1
ORDER BY time_created ASC, id ASC
"#,
    )?;
    let mut rows = stmt.query(params![parent_id])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(NoteItemRecord::from_row(row)?);
    }
    Ok(result)
}

fn row_exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    let exists: i64 = conn.query_row(sql, params![id], |row| row.get(0))?;
    Ok(exists == 1)
}
