use std::fmt;

use bank_domain::Limit;
use chrono::NaiveDate;

/// Ledger changes worth recording in the action log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Inserted { limit: Limit },
    Modified { limit: Limit },
    Added { delta: Limit, new_limit: Limit },
    Held,
    LimitReachedNotified,
    NearLimitNotified { percent: u64 },
    Released,
    UsageReset,
    PeriodAdvanced,
    PeriodReset { grant: u64 },
    RolloverNoticeSent { end_date: NaiveDate },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Inserted { limit } => write!(f, "Insert: {limit}"),
            LedgerEvent::Modified { limit } => write!(f, "Modify: {limit}"),
            LedgerEvent::Added { delta, new_limit } => {
                write!(f, "Add: {delta}, New Limit: {new_limit}")
            }
            LedgerEvent::Held => f.write_str("Held"),
            LedgerEvent::LimitReachedNotified => f.write_str("Notified: limit reached"),
            LedgerEvent::NearLimitNotified { percent } => {
                write!(f, "Notified: {percent}% used")
            }
            LedgerEvent::Released => f.write_str("Released Hold"),
            LedgerEvent::UsageReset => f.write_str("Reset"),
            LedgerEvent::PeriodAdvanced => f.write_str("End of Date Update"),
            LedgerEvent::PeriodReset { grant } => write!(f, "End of Date Reset: {grant}"),
            LedgerEvent::RolloverNoticeSent { end_date } => {
                write!(f, "Notified: period ends {end_date}")
            }
        }
    }
}
