use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Result;
use log::info;

use crate::models::LogEntry;

use super::{read_json_or_default, write_json_pretty};

/// Append-only record of completed detection cycles, stored as a JSON array.
#[derive(Clone)]
pub struct EventLog {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl EventLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Arc::new(path),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Missing or corrupt storage is treated as an empty log.
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut entries: Vec<LogEntry> = read_json_or_default(&self.path);
        entries.push(entry.clone());
        write_json_pretty(&self.path, &entries)?;

        info!(
            "Logged cycle at {} ({} entries)",
            entry.timestamp,
            entries.len()
        );
        Ok(())
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        read_json_or_default(&self.path)
    }
}
