pub mod check_state;
pub mod model;
pub mod time_field;

pub use check_state::{CheckState, ParseCheckStateError};
pub use model::{Counter, Note, NoteItem, NoteItemPatch, NotePatch, Tick};
pub use time_field::{InvalidTimeRange, ParseTimeFieldError, TimeField, TimeRange};
