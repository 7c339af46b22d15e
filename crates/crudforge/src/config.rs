//! Process-wide runtime settings.
//!
//! The configuration is installed at most once, before the first statement runs:
//!
//! ```ignore
//! crudforge::configure(
//!     crudforge::CrudConfig::new()
//!         .command_timeout(Duration::from_secs(30))
//!         .log_sql(true),
//! )?;
//! ```
//!
//! Reading it (any database call does) freezes the defaults for the rest of the process.

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

/// Keys per `IN (...)` batch of the key-specialized bulk statements.
pub const DEFAULT_KEY_BATCH_SIZE: usize = 2000;

/// Runtime settings shared by every compiled statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    /// Keys per batch for key-list operations.
    pub key_batch_size: usize,
    /// Timeout used when a call passes `None`.
    pub command_timeout: Option<Duration>,
    /// Log statements at `debug` instead of `trace`.
    pub log_sql: bool,
    /// Truncate logged SQL to this many bytes.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this are logged at `warn`.
    pub slow_threshold: Option<Duration>,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            key_batch_size: DEFAULT_KEY_BATCH_SIZE,
            command_timeout: None,
            log_sql: false,
            max_sql_length: Some(200),
            slow_threshold: None,
        }
    }
}

impl CrudConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_batch_size(mut self, size: usize) -> Self {
        self.key_batch_size = size;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// Parse from JSON, e.g. a config file section.
    pub fn from_json(json: &str) -> OrmResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| OrmError::validation(format!("invalid crudforge config: {e}")))
    }

    fn validate(&self) -> OrmResult<()> {
        if self.key_batch_size == 0 {
            return Err(OrmError::validation("key_batch_size must be at least 1"));
        }
        Ok(())
    }
}

static CONFIG: OnceLock<CrudConfig> = OnceLock::new();

/// Install the process-wide configuration.
///
/// Fails if the configuration is invalid or has already been installed or read.
pub fn configure(config: CrudConfig) -> OrmResult<()> {
    config.validate()?;
    CONFIG
        .set(config)
        .map_err(|_| OrmError::validation("crudforge is already configured"))
}

/// The active configuration, freezing the defaults if none was installed.
pub fn config() -> &'static CrudConfig {
    CONFIG.get_or_init(CrudConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CrudConfig::default();
        assert_eq!(cfg.key_batch_size, 2000);
        assert_eq!(cfg.command_timeout, None);
        assert!(!cfg.log_sql);
    }

    #[test]
    fn builder_chain() {
        let cfg = CrudConfig::new()
            .key_batch_size(500)
            .command_timeout(Duration::from_secs(5))
            .no_truncate();
        assert_eq!(cfg.key_batch_size, 500);
        assert_eq!(cfg.command_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.max_sql_length, None);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = CrudConfig::from_json(r#"{ "key_batch_size": 100, "log_sql": true }"#).unwrap();
        assert_eq!(cfg.key_batch_size, 100);
        assert!(cfg.log_sql);
        assert_eq!(cfg.max_sql_length, Some(200));
        assert!(CrudConfig::from_json("{ nope").is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = CrudConfig::new().key_batch_size(0).validate().unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }

    #[test]
    fn configuring_after_first_read_fails() {
        let _ = config();
        assert!(configure(CrudConfig::new()).is_err());
    }
}
