//! Narrow interfaces to the systems the bank drives but does not own.

use crate::{error::CollaboratorError, LedgerEvent};

/// Reports cumulative raw usage (CPU-seconds) for an account on a cluster.
pub trait UsageSource: Send + Sync {
    fn raw_usage(&self, account: &str, cluster: &str) -> Result<u64, CollaboratorError>;
}

/// Applies administrative changes to an account on a cluster.
pub trait EnforcementActuator: Send + Sync {
    fn apply_hold(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError>;
    fn release_hold(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError>;
    fn reset_usage(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError>;
}

/// Looks up cluster associations and responsible parties for accounts.
pub trait AccountDirectory: Send + Sync {
    fn has_association(&self, account: &str, cluster: &str) -> Result<bool, CollaboratorError>;
    /// Resolves the address that receives notices for `account`.
    fn recipient(&self, account: &str) -> Result<String, CollaboratorError>;
}

/// Delivers a rendered message.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), CollaboratorError>;
}

/// Durable, human-readable record of ledger changes.
pub trait ActionLog: Send + Sync {
    fn record(&self, account: &str, event: &LedgerEvent) -> std::io::Result<()>;
}
