//! Process configuration resolved from the environment.
//!
//! | variable           | default                          |
//! |--------------------|----------------------------------|
//! | `PUZZLE_DB_PATH`   | `puzzle_records.sqlite3`         |
//! | `PUZZLE_LOG_LEVEL` | [`default_log_level`]            |
//! | `PUZZLE_LOG_DIR`   | unset: file logging stays off    |

use crate::logging::{default_log_level, LogLevel, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "PUZZLE_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "PUZZLE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "PUZZLE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "puzzle_records.sqlite3";

/// An environment variable carried an unusable value.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub source: LoggingError,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.source)
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = LogLevel::parse(&level).map_err(|source| ConfigError {
                variable: LOG_LEVEL_ENV,
                source,
            })?;
        }
        config.log_dir = read(LOG_DIR_ENV).map(PathBuf::from);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn overrides_are_trimmed_and_normalized() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /var/lib/puzzle/records.db "),
            (LOG_LEVEL_ENV, "WARNING"),
            (LOG_DIR_ENV, "/var/log/puzzle"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/puzzle/records.db"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/puzzle")));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(LOG_LEVEL_ENV, "chatty")])).unwrap_err();
        assert_eq!(err.variable, LOG_LEVEL_ENV);
        assert!(err.to_string().contains("unknown log level `chatty`"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = CoreConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "   ")])).unwrap();
        assert!(config.log_dir.is_none());
    }
}
