use std::fmt::Write;

use time::{OffsetDateTime, UtcOffset, Weekday};

/// Which parts of an instant to render, and in which offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeFormat {
    pub show_weekday: bool,
    pub omit_year: bool,
    pub omit_date: bool,
    pub omit_time: bool,
    pub omit_seconds: bool,
    pub offset: UtcOffset,
}

impl Default for DateTimeFormat {
    fn default() -> Self {
        Self {
            show_weekday: false,
            omit_year: false,
            omit_date: false,
            omit_time: false,
            omit_seconds: false,
            offset: UtcOffset::UTC,
        }
    }
}

impl DateTimeFormat {
    /// Renders `[Www ][YYYY-]MM-DD[ HH:MM[:SS]]`.
    pub fn format(&self, ts: OffsetDateTime) -> String {
        // Near the calendar edges the shifted instant may not exist; fall
        // back to the stored offset rather than fail.
        let local = ts.checked_to_offset(self.offset).unwrap_or(ts);
        let mut out = String::new();

        if !self.omit_date {
            if self.show_weekday {
                let _ = write!(out, "{} ", weekday_abbrev(local.weekday()));
            }
            if !self.omit_year {
                let _ = write!(out, "{:04}-", local.year());
            }
            let _ = write!(out, "{:02}-{:02}", u8::from(local.month()), local.day());
        }

        if !self.omit_time {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{:02}:{:02}", local.hour(), local.minute());
            if !self.omit_seconds {
                let _ = write!(out, ":{:02}", local.second());
            }
        }

        out
    }
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

/// Coarse age of `ts` relative to `now`: `just now`, `5m ago`, `in 2h`.
pub fn format_relative(ts: OffsetDateTime, now: OffsetDateTime) -> String {
    let delta = now - ts;
    let seconds = delta.whole_seconds();
    let magnitude = seconds.unsigned_abs();
    if magnitude < 60 {
        return "just now".to_string();
    }

    let amount = if magnitude < 3_600 {
        format!("{}m", magnitude / 60)
    } else if magnitude < 86_400 {
        format!("{}h", magnitude / 3_600)
    } else {
        format!("{}d", magnitude / 86_400)
    };

    if seconds > 0 {
        format!("{amount} ago")
    } else {
        format!("in {amount}")
    }
}
