//! bank-domain
//!
//! Pure domain models for the allocation ledger (entries, limits, side effects).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod entry;
pub mod effect;
pub mod limit;
pub mod units;

pub use effect::*;
pub use entry::*;
pub use limit::*;
pub use units::*;
