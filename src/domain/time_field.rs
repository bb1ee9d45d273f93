use std::error::Error;
use std::fmt;
use std::str::FromStr;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Which timestamp a query filters and sorts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeField {
    Created,
    #[default]
    Modified,
    ForData,
}

impl TimeField {
    pub const ALL: [TimeField; 3] = [TimeField::Created, TimeField::Modified, TimeField::ForData];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeField::Created => "created",
            TimeField::Modified => "modified",
            TimeField::ForData => "data",
        }
    }

    /// Only ticks carry a data timestamp.
    pub fn applies_to_parents(self) -> bool {
        !matches!(self, TimeField::ForData)
    }
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeField {
    type Err = ParseTimeFieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "created" | "time_created" => Ok(TimeField::Created),
            "modified" | "time_modified" => Ok(TimeField::Modified),
            "data" | "for_data" | "time_for_data" => Ok(TimeField::ForData),
            _ => Err(ParseTimeFieldError {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeFieldError {
    value: String,
}

impl fmt::Display for ParseTimeFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid time field '{}': expected one of {}",
            self.value,
            TimeField::ALL
                .iter()
                .map(|field| field.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseTimeFieldError {}

/// Inclusive range; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
}

impl TimeRange {
    pub const ALL: TimeRange = TimeRange {
        start: None,
        end: None,
    };

    pub fn new(
        start: Option<OffsetDateTime>,
        end: Option<OffsetDateTime>,
    ) -> Result<Self, InvalidTimeRange> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(InvalidTimeRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        self.start.map_or(true, |start| ts >= start) && self.end.map_or(true, |end| ts <= end)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Bounds as unix milliseconds, open ends widened to the i64 extremes.
    pub fn as_millis(&self) -> (i64, i64) {
        (
            self.start.map_or(i64::MIN, to_millis),
            self.end.map_or(i64::MAX, to_millis),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTimeRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl fmt::Display for InvalidTimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid time range: start {} is after end {}",
            self.start, self.end
        )
    }
}

impl Error for InvalidTimeRange {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Parses RFC 3339 or a bare `YYYY-MM-DD`; a bare date expands to the first
/// or last millisecond of that UTC day depending on `bound`.
pub fn parse_instant(raw: &str, bound: Bound) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        // An offset can push the UTC instant past the supported date range.
        let utc = ts.checked_to_offset(UtcOffset::UTC)?;
        return Some(truncate_to_millis(utc));
    }

    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()?;
    let time = match bound {
        Bound::Start => Time::MIDNIGHT,
        Bound::End => Time::from_hms_milli(23, 59, 59, 999).ok()?,
    };
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}

pub fn to_millis(ts: OffsetDateTime) -> i64 {
    let millis = ts.unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(if millis < 0 { i64::MIN } else { i64::MAX })
}

pub fn from_millis(millis: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn truncate_to_millis(ts: OffsetDateTime) -> OffsetDateTime {
    from_millis(to_millis(ts))
}
