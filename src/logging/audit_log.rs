use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Error};
use log::{LevelFilter, Log, Metadata, Record};

use super::LogEntry;

/// Writes every record as one JSON object per line, so a run can be
/// reviewed after the fact.
#[derive(Debug)]
pub struct AuditLog {
    target: Mutex<BufWriter<File>>,
    max_level: LevelFilter,
}

impl AuditLog {
    /// Creates or truncates the audit log at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create audit log '{}'", path.as_ref().display()))?;

        Ok(Self {
            target: Mutex::new(BufWriter::new(file)),
            max_level: LevelFilter::Debug,
        })
    }

    pub fn with_max_level(self, max_level: LevelFilter) -> Self {
        Self { max_level, ..self }
    }

    pub fn into_logger(self) -> Box<dyn Log> {
        Box::new(self)
    }

    fn write_entry(&self, record: &Record) -> Result<(), Error> {
        let mut serialized = serde_json::to_string(&LogEntry::from(record))?;
        serialized.push('\n');

        let mut target = self
            .target
            .lock()
            .map_err(|_| anyhow::anyhow!("Audit log lock poisoned"))?;
        target.write_all(serialized.as_bytes())?;
        Ok(())
    }
}

impl Log for AuditLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        // Losing an audit line must not abort the run.
        let _ = self.write_entry(record);
    }

    fn flush(&self) {
        if let Ok(mut target) = self.target.lock() {
            let _ = target.flush();
        }
    }
}
