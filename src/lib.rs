#![doc(test(attr(deny(warnings))))]

//! CRC Bank keeps a ledger of service-unit allocations for cluster accounts
//! and enforces them through Slurm: it holds accounts that exhaust their
//! allocation, notifies the people responsible, and rolls allocations over
//! once a year.

pub mod action_log;
pub mod cli;
pub mod errors;
pub mod notify;
pub mod runtime;
pub mod slurm;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("CRC Bank tracing initialized.");
    });
}
