//! Per-account ledger records.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::limit::Limit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Allocation state for a single account.
pub struct AccountLedgerEntry {
    pub account: String,
    pub limit: Limit,
    pub period_start: NaiveDate,
    #[serde(default)]
    pub near_limit_notified: bool,
    #[serde(default)]
    pub limit_reached_notified: bool,
}

impl AccountLedgerEntry {
    /// Creates an entry whose period starts on `today` with no notices sent.
    pub fn new(account: impl Into<String>, limit: Limit, today: NaiveDate) -> Self {
        Self {
            account: account.into(),
            limit,
            period_start: today,
            near_limit_notified: false,
            limit_reached_notified: false,
        }
    }

    /// Clears both notification flags so thresholds fire again.
    pub fn rearm_notifications(&mut self) {
        self.near_limit_notified = false;
        self.limit_reached_notified = false;
    }

    /// Starts a new allocation period on `today` and re-arms notifications.
    ///
    /// The period start never moves backwards.
    pub fn begin_period(&mut self, today: NaiveDate) {
        if today > self.period_start {
            self.period_start = today;
        }
        self.rearm_notifications();
    }

    /// Whole days elapsed since the period started.
    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (today - self.period_start).num_days()
    }

    /// Date the current period ends, `period_days` after it started.
    pub fn period_end(&self, period_days: u32) -> NaiveDate {
        self.period_start + Duration::days(i64::from(period_days))
    }
}
