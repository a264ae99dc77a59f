//! bank-core
//!
//! Allocation engine and service orchestration for the allocation bank.
//! Depends on bank-domain. No CLI, no terminal I/O, no direct process or file access:
//! the cluster, the mail system and the ledger store are reached through traits.

pub mod bank_service;
pub mod collaborators;
pub mod engine;
pub mod error;
pub mod event;
pub mod export;
pub mod notice;
pub mod policy;
pub mod storage;
pub mod time;

pub use bank_service::*;
pub use collaborators::*;
pub use engine::*;
pub use error::{CollaboratorError, CoreError};
pub use event::LedgerEvent;
pub use export::*;
pub use notice::*;
pub use policy::*;
pub use storage::{index_entries, LedgerStore, MemoryLedgerStore};
pub use time::*;
