//! Runtime configuration for hosts embedding the roster core.
//!
//! Library APIs take explicit arguments; this struct only gathers them for
//! binaries that load settings from a JSON file.

use crate::db::StoreOptions;
use crate::logging::LogLevel;
use crate::service::paging::{PageLimits, ROSTER_DEFAULT_PAGE_SIZE, ROSTER_MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_FILE_NAME: &str = "classroll.sqlite3";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub roster_default_page_size: u32,
    pub roster_max_page_size: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: LogLevel::build_default(),
            log_dir: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            roster_default_page_size: ROSTER_DEFAULT_PAGE_SIZE,
            roster_max_page_size: ROSTER_MAX_PAGE_SIZE,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON document; missing keys keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.roster_default_page_size,
            max_page_size: self.roster_max_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreConfig;
    use crate::logging::LogLevel;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.store_options().busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn overrides_are_applied() {
        let config = CoreConfig::from_json_str(
            r#"{
                "db_path": "/var/lib/classroll/roster.db",
                "log_level": "warn",
                "roster_max_page_size": 50
            }"#,
        )
        .expect("config should parse");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/classroll/roster.db"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.page_limits().max_page_size, 50);
        assert_eq!(config.page_limits().default_page_size, 20);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CoreConfig::from_json_str(r#"{"capacity": 3}"#).is_err());
    }
}
