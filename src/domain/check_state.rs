use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckState {
    None,
    Checked,
    Unchecked,
    Partial,
    #[default]
    Default,
}

impl CheckState {
    pub const ALL: [CheckState; 5] = [
        CheckState::None,
        CheckState::Checked,
        CheckState::Unchecked,
        CheckState::Partial,
        CheckState::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckState::None => "none",
            CheckState::Checked => "checked",
            CheckState::Unchecked => "unchecked",
            CheckState::Partial => "partial",
            CheckState::Default => "default",
        }
    }

    pub fn is_checked(self) -> bool {
        self == CheckState::Checked
    }

    pub fn toggle(self) -> CheckState {
        match self {
            CheckState::Checked => CheckState::Unchecked,
            _ => CheckState::Checked,
        }
    }

    /// Rolls item states up into the state shown for their note.
    pub fn summarize<I>(states: I) -> CheckState
    where
        I: IntoIterator<Item = CheckState>,
    {
        let mut total = 0usize;
        let mut checked = 0usize;
        for state in states {
            total += 1;
            if state.is_checked() {
                checked += 1;
            }
        }

        if total == 0 {
            CheckState::None
        } else if checked == total {
            CheckState::Checked
        } else if checked == 0 {
            CheckState::Unchecked
        } else {
            CheckState::Partial
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CheckState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for CheckState {
    type Err = ParseCheckStateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let state = match normalized.as_str() {
            "none" => CheckState::None,
            "checked" | "done" | "x" => CheckState::Checked,
            "unchecked" | "todo" => CheckState::Unchecked,
            "partial" => CheckState::Partial,
            "default" | "" => CheckState::Default,
            _ => {
                return Err(ParseCheckStateError {
                    value: value.to_string(),
                });
            }
        };

        Ok(state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCheckStateError {
    value: String,
}

impl fmt::Display for ParseCheckStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid check state '{}': expected one of {}",
            self.value,
            CheckState::ALL
                .iter()
                .map(|state| state.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseCheckStateError {}

#[cfg(test)]
mod tests {
    use super::CheckState;
    use std::str::FromStr;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!(
            CheckState::from_str("Checked").unwrap(),
            CheckState::Checked
        );
        assert_eq!(CheckState::from_str(" todo ").unwrap(), CheckState::Unchecked);
        assert_eq!(CheckState::from_str("x").unwrap(), CheckState::Checked);
        assert_eq!(CheckState::from_str("").unwrap(), CheckState::Default);
        assert!(CheckState::from_str("maybe").is_err());
    }

    #[test]
    fn every_state_round_trips_through_its_name() {
        for state in CheckState::ALL {
            assert_eq!(CheckState::from_str(state.as_str()).unwrap(), state);
        }
    }

    #[test]
    fn toggle_flips_checked_and_checks_everything_else() {
        assert_eq!(CheckState::Checked.toggle(), CheckState::Unchecked);
        assert_eq!(CheckState::Unchecked.toggle(), CheckState::Checked);
        assert_eq!(CheckState::Partial.toggle(), CheckState::Checked);
        assert_eq!(CheckState::Default.toggle(), CheckState::Checked);
        assert_eq!(CheckState::None.toggle(), CheckState::Checked);
    }

    #[test]
    fn summarize_rolls_up_item_states() {
        assert_eq!(CheckState::summarize(Vec::new()), CheckState::None);
        assert_eq!(
            CheckState::summarize([CheckState::Checked, CheckState::Checked]),
            CheckState::Checked
        );
        assert_eq!(
            CheckState::summarize([CheckState::Unchecked, CheckState::Default]),
            CheckState::Unchecked
        );
        assert_eq!(
            CheckState::summarize([CheckState::Checked, CheckState::Default]),
            CheckState::Partial
        );
    }

    #[test]
    fn parse_error_lists_valid_states() {
        let err = CheckState::from_str("nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid check state 'nope': expected one of none, checked, unchecked, partial, default"
        );
    }
}
