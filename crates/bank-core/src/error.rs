use std::io;

use bank_domain::Limit;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
    #[error("Account {0} already exists in the ledger, did you want to modify it?")]
    AccountExists(String),
    #[error("Account {0} doesn't exist in the ledger, did you want to insert it?")]
    AccountNotFound(String),
    #[error(
        "Usage on account {account} ({usage} SUs) is not below its limit ({limit}), add service units first"
    )]
    UsageExceedsLimit {
        account: String,
        usage: u64,
        limit: Limit,
    },
    #[error("Malformed ledger document: {0}")]
    Format(String),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("No association for account {account} on cluster {cluster}")]
    MissingAssociation { account: String, cluster: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Failures reported by the usage source, actuator, directory or notifier.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("unexpected output from `{program}`: {detail}")]
    Output { program: String, detail: String },
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
