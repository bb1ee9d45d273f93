use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use time::macros::format_description;
use time::UtcOffset;

use crate::datetime_format::DateTimeFormat;
use crate::domain::TimeField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub datetime: DateTimeFormat,
    pub relative_times: bool,
    pub counter_field: TimeField,
    pub tick_field: TimeField,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datetime: DateTimeFormat {
                omit_seconds: true,
                ..DateTimeFormat::default()
            },
            relative_times: false,
            counter_field: TimeField::Modified,
            tick_field: TimeField::ForData,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigFile {
    #[serde(default)]
    display: RawDisplay,
    #[serde(default)]
    query: RawQuery,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDisplay {
    show_weekday: bool,
    omit_year: bool,
    omit_date: bool,
    omit_time: bool,
    omit_seconds: bool,
    utc_offset: String,
    relative: bool,
}

impl Default for RawDisplay {
    fn default() -> Self {
        Self {
            show_weekday: false,
            omit_year: false,
            omit_date: false,
            omit_time: false,
            omit_seconds: true,
            utc_offset: "+00:00".to_string(),
            relative: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawQuery {
    counter_field: String,
    tick_field: String,
}

impl Default for RawQuery {
    fn default() -> Self {
        Self {
            counter_field: TimeField::Modified.as_str().to_string(),
            tick_field: TimeField::ForData.as_str().to_string(),
        }
    }
}

impl Config {
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|err| err.at(path))
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let file: RawConfigFile =
            toml::from_str(raw).map_err(|err| ConfigError::Parse {
                path: None,
                message: err.to_string(),
            })?;

        let offset = parse_offset(&file.display.utc_offset)?;
        let counter_field = parse_field("query.counter_field", &file.query.counter_field)?;
        if !counter_field.applies_to_parents() {
            return Err(ConfigError::Invalid(format!(
                "query.counter_field cannot be '{counter_field}'"
            )));
        }
        let tick_field = parse_field("query.tick_field", &file.query.tick_field)?;

        Ok(Self {
            datetime: DateTimeFormat {
                show_weekday: file.display.show_weekday,
                omit_year: file.display.omit_year,
                omit_date: file.display.omit_date,
                omit_time: file.display.omit_time,
                omit_seconds: file.display.omit_seconds,
                offset,
            },
            relative_times: file.display.relative,
            counter_field,
            tick_field,
        })
    }
}

fn parse_offset(raw: &str) -> Result<UtcOffset, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        trimmed,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| {
        ConfigError::Invalid(format!(
            "display.utc_offset '{raw}' is not of the form +HH:MM"
        ))
    })
}

fn parse_field(key: &str, raw: &str) -> Result<TimeField, ConfigError> {
    TimeField::from_str(raw).map_err(|err| ConfigError::Invalid(format!("{key}: {err}")))
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        message: String,
    },
    Invalid(String),
}

impl ConfigError {
    fn at(self, path: &Path) -> Self {
        match self {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse {
                path: Some(path),
                message,
            } => write!(f, "invalid config {}: {}", path.display(), message),
            ConfigError::Parse {
                path: None,
                message,
            } => write!(f, "invalid config: {}", message),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::domain::TimeField;
    use std::path::PathBuf;
    use time::macros::offset;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").expect("empty config should parse");
        assert_eq!(config, Config::default());
        assert!(config.datetime.omit_seconds);
        assert_eq!(config.tick_field, TimeField::ForData);
    }

    #[test]
    fn reads_display_and_query_sections() {
        let config = Config::parse(
            r#"
[display]
show_weekday = true
omit_year = true
omit_seconds = false
utc_offset = "-05:30"
relative = true

[query]
counter_field = "created"
tick_field = "modified"
"#,
        )
        .expect("config should parse");
        assert!(config.datetime.show_weekday);
        assert!(config.datetime.omit_year);
        assert!(!config.datetime.omit_seconds);
        assert_eq!(config.datetime.offset, offset!(-5:30));
        assert!(config.relative_times);
        assert_eq!(config.counter_field, TimeField::Created);
        assert_eq!(config.tick_field, TimeField::Modified);
    }

    #[test]
    fn utc_offset_accepts_aliases_and_negative_zero_hours() {
        for alias in ["z", "Z", "utc", " UTC "] {
            let config = Config::parse(&format!("[display]\nutc_offset = \"{alias}\"\n"))
                .expect("alias should parse");
            assert_eq!(config.datetime.offset, offset!(UTC));
        }

        let config = Config::parse("[display]\nutc_offset = \"-00:30\"\n")
            .expect("negative half hour should parse");
        assert_eq!(config.datetime.offset.whole_minutes(), -30);
        assert!(config.datetime.offset.is_negative());

        let config = Config::parse("[display]\nutc_offset = \"+14:00\"\n")
            .expect("largest real offset should parse");
        assert_eq!(config.datetime.offset.whole_hours(), 14);
    }

    #[test]
    fn utc_offset_rejects_malformed_values() {
        for bad in ["00:30", "+0:30", "+05:60", "+5", "-99:00", "+ab:cd"] {
            let raw = format!("[display]\nutc_offset = \"{bad}\"\n");
            assert!(Config::parse(&raw).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse("[display]\nutc_offset = \"tomorrow\"\n").is_err());
        assert!(Config::parse("[query]\ncounter_field = \"data\"\n").is_err());
        assert!(Config::parse("[query]\ntick_field = \"sometime\"\n").is_err());
        assert!(Config::parse("[display]\ncolour = true\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = PathBuf::from("/nonexistent/tally/config.toml");
        assert_eq!(Config::load(&path).expect("defaults"), Config::default());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = std::env::temp_dir().join(format!("tally-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        let path = dir.join("config.toml");
        std::fs::write(&path, "[display\n").expect("config should be writable");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"), "{err}");
        let _ = std::fs::remove_dir_all(dir);
    }
}
