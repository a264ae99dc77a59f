use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use bank_domain::AccountLedgerEntry;

use crate::CoreError;

/// Keyed, durable home of every [`AccountLedgerEntry`].
///
/// Each call must be all-or-nothing: a failed write leaves the previous
/// contents in place.
pub trait LedgerStore: Send + Sync {
    fn get(&self, account: &str) -> Result<Option<AccountLedgerEntry>, CoreError>;
    /// Returns every entry ordered by account.
    fn all(&self) -> Result<Vec<AccountLedgerEntry>, CoreError>;
    fn upsert(&self, entry: &AccountLedgerEntry) -> Result<(), CoreError>;
    fn replace_all(&self, entries: Vec<AccountLedgerEntry>) -> Result<(), CoreError>;
    fn drop_and_recreate(&self) -> Result<(), CoreError>;
}

/// Indexes entries by account, rejecting duplicates.
pub fn index_entries(
    entries: Vec<AccountLedgerEntry>,
) -> Result<BTreeMap<String, AccountLedgerEntry>, CoreError> {
    let mut indexed = BTreeMap::new();
    for entry in entries {
        let account = entry.account.clone();
        if indexed.insert(account.clone(), entry).is_some() {
            return Err(CoreError::Format(format!(
                "account {account} appears more than once"
            )));
        }
    }
    Ok(indexed)
}

/// Volatile store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: Mutex<BTreeMap<String, AccountLedgerEntry>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, AccountLedgerEntry>>, CoreError> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Storage("ledger lock poisoned".into()))
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn get(&self, account: &str) -> Result<Option<AccountLedgerEntry>, CoreError> {
        Ok(self.lock()?.get(account).cloned())
    }

    fn all(&self) -> Result<Vec<AccountLedgerEntry>, CoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn upsert(&self, entry: &AccountLedgerEntry) -> Result<(), CoreError> {
        self.lock()?.insert(entry.account.clone(), entry.clone());
        Ok(())
    }

    fn replace_all(&self, entries: Vec<AccountLedgerEntry>) -> Result<(), CoreError> {
        let indexed = index_entries(entries)?;
        *self.lock()? = indexed;
        Ok(())
    }

    fn drop_and_recreate(&self) -> Result<(), CoreError> {
        self.lock()?.clear();
        Ok(())
    }
}
