//! Append-only text log of ledger changes.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use bank_core::{ActionLog, LedgerEvent};
use chrono::Local;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Writes one `<timestamp>: Account: <account> <event>` line per change.
#[derive(Debug, Clone)]
pub struct FileActionLog {
    path: PathBuf,
}

impl FileActionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActionLog for FileActionLog {
    fn record(&self, account: &str, event: &LedgerEvent) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{}: Account: {} {}",
            Local::now().format(TIMESTAMP_FORMAT),
            account,
            event
        )
    }
}
