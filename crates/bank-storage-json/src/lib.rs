use std::{
    cmp::Reverse,
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    sync::{Mutex, MutexGuard},
};

use bank_core::{index_entries, parse_export, CoreError, LedgerExport, LedgerStore};
use bank_domain::AccountLedgerEntry;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const LEDGER_SCHEMA_VERSION: u32 = 1;
const BACKUP_DIR: &str = "backups";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const LOCK_SUFFIX: &str = "lock";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

type Entries = BTreeMap<String, AccountLedgerEntry>;

#[derive(Serialize)]
struct LedgerDocument<'a> {
    schema_version: u32,
    entries: Vec<&'a AccountLedgerEntry>,
}

#[derive(Deserialize)]
struct StoredLedger {
    schema_version: u32,
    #[serde(default)]
    entries: Vec<AccountLedgerEntry>,
}

/// Single-file JSON ledger.
///
/// The store holds an exclusive lock file next to the ledger for as long as
/// it lives, so two invocations never interleave their writes. Every write
/// goes through a temporary file and a rename, after the previous file has
/// been copied into `backups/`.
pub struct JsonLedgerStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    lock: LockFile,
    entries: Mutex<Entries>,
}

impl JsonLedgerStore {
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(path, DEFAULT_RETENTION)
    }

    pub fn with_retention(path: PathBuf, retention: usize) -> Result<Self, CoreError> {
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent)?;
        let lock = LockFile::acquire(lock_path(&path))?;
        let entries = if path.exists() {
            load_entries(&path)?
        } else {
            Entries::new()
        };
        Ok(Self {
            backups_dir: parent.join(BACKUP_DIR),
            path,
            retention: retention.max(1),
            lock,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock.path
    }

    /// Backups of earlier ledger files, newest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", self.stem());
        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix));
            if matches {
                backups.push(path);
            }
        }
        backups.sort_by_key(|path| Reverse(parse_backup_timestamp(path)));
        Ok(backups)
    }

    fn state(&self) -> Result<MutexGuard<'_, Entries>, CoreError> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Storage("ledger lock poisoned".into()))
    }

    /// Persists `next` and only then makes it the in-memory state.
    fn commit(&self, state: &mut Entries, next: Entries) -> Result<(), CoreError> {
        self.backup_existing_file()?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &serialize_entries(&next)?)?;
        fs::rename(&tmp, &self.path)?;
        *state = next;
        Ok(())
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("ledger")
            .to_string()
    }

    fn backup_existing_file(&self) -> Result<(), CoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let file_name = format!("{}_{}.{}", self.stem(), timestamp, BACKUP_EXTENSION);
        fs::copy(&self.path, self.backups_dir.join(file_name))?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for path in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&path) {
                warn!(backup = %path.display(), error = %err, "failed to prune ledger backup");
            }
        }
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn get(&self, account: &str) -> Result<Option<AccountLedgerEntry>, CoreError> {
        Ok(self.state()?.get(account).cloned())
    }

    fn all(&self) -> Result<Vec<AccountLedgerEntry>, CoreError> {
        Ok(self.state()?.values().cloned().collect())
    }

    fn upsert(&self, entry: &AccountLedgerEntry) -> Result<(), CoreError> {
        let mut state = self.state()?;
        let mut next = state.clone();
        next.insert(entry.account.clone(), entry.clone());
        self.commit(&mut state, next)
    }

    fn replace_all(&self, entries: Vec<AccountLedgerEntry>) -> Result<(), CoreError> {
        let next = index_entries(entries)?;
        let mut state = self.state()?;
        self.commit(&mut state, next)
    }

    fn drop_and_recreate(&self) -> Result<(), CoreError> {
        let mut state = self.state()?;
        self.commit(&mut state, Entries::new())
    }
}

/// Writes a backup document, refusing to replace an existing file.
pub fn write_export(export: &LedgerExport, path: &Path) -> Result<(), CoreError> {
    if path.exists() {
        return Err(CoreError::Storage(format!(
            "{} already exists, choose another file",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_atomic(&tmp, &export.to_json()?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads and validates a backup document.
pub fn read_export(path: &Path) -> Result<Vec<AccountLedgerEntry>, CoreError> {
    if !path.exists() {
        return Err(CoreError::Storage(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let data = fs::read_to_string(path)?;
    parse_export(&data)
}

fn load_entries(path: &Path) -> Result<Entries, CoreError> {
    let data = fs::read_to_string(path)?;
    let stored: StoredLedger =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if stored.schema_version != LEDGER_SCHEMA_VERSION {
        return Err(CoreError::Format(format!(
            "{} has schema version {}, expected {}",
            path.display(),
            stored.schema_version,
            LEDGER_SCHEMA_VERSION
        )));
    }
    index_entries(stored.entries)
}

fn serialize_entries(entries: &Entries) -> Result<String, CoreError> {
    let document = LedgerDocument {
        schema_version: LEDGER_SCHEMA_VERSION,
        entries: entries.values().collect(),
    };
    serde_json::to_string_pretty(&document).map_err(|err| CoreError::Serde(err.to_string()))
}

/// Exclusive marker file, removed when dropped.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf) -> Result<Self, CoreError> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", process::id())?;
                Ok(Self { path })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Err(CoreError::Storage(format!(
                    "ledger is in use by another process; remove {} if it is stale",
                    path.display()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn parse_backup_timestamp(path: &Path) -> Option<DateTime<Utc>> {
    let stem = path.file_stem()?.to_str()?;
    let mut segments = stem.rsplitn(3, '_');
    let time = segments.next()?;
    let date = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    let raw = format!("{}{}", date, time);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn lock_path(path: &Path) -> PathBuf {
    suffixed(path, LOCK_SUFFIX)
}

fn tmp_path(path: &Path) -> PathBuf {
    suffixed(path, TMP_SUFFIX)
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, suffix),
        None => suffix.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_timestamps_sort_newest_first() {
        let older = Path::new("/b/crc-bank_20250101_090000.json");
        let newer = Path::new("/b/crc-bank_20250101_090001.json");
        assert!(parse_backup_timestamp(newer) > parse_backup_timestamp(older));
        assert_eq!(parse_backup_timestamp(Path::new("/b/crc-bank.json")), None);
    }

    #[test]
    fn sidecar_paths_keep_extension() {
        let path = Path::new("/data/crc-bank.json");
        assert_eq!(tmp_path(path), PathBuf::from("/data/crc-bank.json.tmp"));
        assert_eq!(lock_path(path), PathBuf::from("/data/crc-bank.json.lock"));
    }
}
