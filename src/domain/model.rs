use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::check_state::CheckState;
use super::time_field::TimeField;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Counter {
    pub id: i64,
    pub name: String,
    #[serde(serialize_with = "rfc3339")]
    pub time_created: OffsetDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub time_modified: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tick {
    pub id: i64,
    pub parent_id: i64,
    pub amount: f64,
    #[serde(serialize_with = "rfc3339")]
    pub time_created: OffsetDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub time_modified: OffsetDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub time_for_data: OffsetDateTime,
}

impl Tick {
    pub fn time(&self, field: TimeField) -> OffsetDateTime {
        match field {
            TimeField::Created => self.time_created,
            TimeField::Modified => self.time_modified,
            TimeField::ForData => self.time_for_data,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    #[serde(serialize_with = "rfc3339")]
    pub time_created: OffsetDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub time_modified: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NoteItem {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub field: String,
    pub description: String,
    pub state: CheckState,
    #[serde(serialize_with = "rfc3339")]
    pub time_created: OffsetDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub time_modified: OffsetDateTime,
}

/// Optional text fields for note edits; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
}

impl NotePatch {
    pub fn has_changes(&self) -> bool {
        self.title.is_some() || self.subtitle.is_some() || self.description.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteItemPatch {
    pub name: Option<String>,
    pub field: Option<String>,
    pub description: Option<String>,
    pub state: Option<CheckState>,
}

impl NoteItemPatch {
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.field.is_some()
            || self.description.is_some()
            || self.state.is_some()
    }
}

pub(crate) fn rfc3339<S: Serializer>(
    ts: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let formatted = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

pub(crate) fn rfc3339_opt<S: Serializer>(
    ts: &Option<OffsetDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => rfc3339(ts, serializer),
        None => serializer.serialize_none(),
    }
}
