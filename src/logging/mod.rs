use std::path::Path;

use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub mod audit_log;
pub mod multilog;

use audit_log::AuditLog;
use multilog::MultiLogger;

/// One line of the audit log.
#[derive(Debug, Serialize, Deserialize)]
struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub target: String,
    pub module: String,
    pub line: u32,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for Level {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::Trace,
        }
    }
}

impl From<&log::Record<'_>> for LogEntry {
    fn from(value: &log::Record) -> Self {
        Self {
            timestamp: Utc::now(),
            level: value.level().into(),
            message: value.args().to_string(),
            target: value.target().to_string(),
            module: value.module_path().unwrap_or_default().to_string(),
            line: value.line().unwrap_or_default(),
        }
    }
}

/// Level of the audit log, independent of `--verbosity`.
const AUDIT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

/// Most verbose level any installed logger wants.
fn global_max_level(verbosity: LevelFilter, audit_log: bool) -> LevelFilter {
    if audit_log {
        verbosity.max(AUDIT_LOG_LEVEL)
    } else {
        verbosity
    }
}

/// Installs the global logger: `env_logger` on stderr at `verbosity` and,
/// if `audit_log` is given, a JSON lines audit log at debug level.
pub fn init(verbosity: LevelFilter, audit_log: Option<&Path>) -> Result<(), Error> {
    let mut logger = MultiLogger::new()
        .with_max_level(global_max_level(verbosity, audit_log.is_some()))
        .with_logger(Box::new(
            env_logger::builder()
                .format_timestamp_secs()
                .filter_level(verbosity)
                .build(),
        ))
        .with_target_filter("reqwest", LevelFilter::Info)
        .with_target_filter("hyper", LevelFilter::Warn);

    if let Some(path) = audit_log {
        logger.add_logger(
            AuditLog::create(path)?
                .with_max_level(AUDIT_LOG_LEVEL)
                .into_logger(),
        );
    }

    logger.init().context("Logger already registered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry() {
        let entry = LogEntry::from(
            &log::Record::builder()
                .args(format_args!("Collected 'lvs'"))
                .level(log::Level::Info)
                .target("upcheck::snapshot")
                .module_path(Some("upcheck::snapshot"))
                .line(Some(12))
                .build(),
        );

        assert_eq!(entry.level, Level::Info);
        assert_eq!(entry.message, "Collected 'lvs'");
        assert_eq!(entry.module, "upcheck::snapshot");
        assert_eq!(entry.line, 12);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "info");
    }

    #[test]
    fn test_global_max_level() {
        assert_eq!(
            global_max_level(LevelFilter::Warn, false),
            LevelFilter::Warn
        );
        assert_eq!(
            global_max_level(LevelFilter::Warn, true),
            LevelFilter::Debug
        );
        assert_eq!(
            global_max_level(LevelFilter::Trace, true),
            LevelFilter::Trace
        );
        assert_eq!(global_max_level(LevelFilter::Off, false), LevelFilter::Off);
    }
}
