//! Decision rules for the allocation ledger.
//!
//! Every operation takes the account's current entry (an owned, in-memory
//! copy), and returns a [`Decision`]: the entry as it should be persisted plus
//! the side effects the caller must carry out first. Nothing here performs
//! I/O, so the rules can be exercised with plain values.

use bank_domain::{
    percent_used, AccountLedgerEntry, EnforcementAction, Limit, Notice, SideEffect,
};
use chrono::NaiveDate;
use tracing::debug;

use crate::{AllocationPolicy, CoreError, LedgerEvent};

/// Result of applying one operation to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub entry: AccountLedgerEntry,
    pub effects: Vec<SideEffect>,
    pub events: Vec<LedgerEvent>,
    /// Operator-facing warnings that do not block the operation.
    pub advisories: Vec<String>,
}

impl Decision {
    fn keep(entry: AccountLedgerEntry) -> Self {
        Self {
            entry,
            effects: Vec::new(),
            events: Vec::new(),
            advisories: Vec::new(),
        }
    }

    fn effect(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }

    fn event(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn holds(&self) -> usize {
        self.count_action(EnforcementAction::Hold)
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.effects.iter().filter_map(SideEffect::notice)
    }

    fn count_action(&self, action: EnforcementAction) -> usize {
        self.effects
            .iter()
            .filter(|effect| effect.action() == Some(action))
            .count()
    }
}

/// Pure decision logic over [`AccountLedgerEntry`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationEngine {
    policy: AllocationPolicy,
}

impl AllocationEngine {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    /// Creates the entry for a new account.
    pub fn insert(
        &self,
        existing: Option<&AccountLedgerEntry>,
        account: &str,
        requested: &str,
        today: NaiveDate,
    ) -> Result<Decision, CoreError> {
        if existing.is_some() {
            return Err(CoreError::AccountExists(account.to_string()));
        }
        let limit = self.policy.parse_limit(requested)?;
        let mut decision = Decision::keep(AccountLedgerEntry::new(account, limit, today));
        warn_if_unlimited(&mut decision, limit);
        decision.event(LedgerEvent::Inserted { limit });
        Ok(decision)
    }

    /// Replaces the limit and restarts the period.
    pub fn modify(
        &self,
        entry: AccountLedgerEntry,
        requested: &str,
        today: NaiveDate,
    ) -> Result<Decision, CoreError> {
        let limit = self.policy.parse_limit(requested)?;
        let mut decision = Decision::keep(entry);
        decision.entry.limit = limit;
        decision.entry.begin_period(today);
        warn_if_unlimited(&mut decision, limit);
        decision.event(LedgerEvent::Modified { limit });
        Ok(decision)
    }

    /// Tops up the limit without restarting the period.
    ///
    /// The percentage basis changes, so both notices are re-armed.
    pub fn add(&self, entry: AccountLedgerEntry, delta: &str) -> Result<Decision, CoreError> {
        let delta = self.policy.parse_limit(delta)?;
        let new_limit = entry.limit.checked_add(delta).map_err(|err| {
            CoreError::InvalidLimit(format!(
                "adding {} to {} on account {}: {err}",
                delta.raw(),
                entry.limit.raw(),
                entry.account
            ))
        })?;
        let mut decision = Decision::keep(entry);
        decision.entry.limit = new_limit;
        decision.entry.rearm_notifications();
        warn_if_unlimited(&mut decision, new_limit);
        decision.event(LedgerEvent::Added { delta, new_limit });
        Ok(decision)
    }

    /// Enforces the limit against `usage`, in service units.
    pub fn check_usage(&self, entry: AccountLedgerEntry, usage: u64) -> Decision {
        let mut decision = Decision::keep(entry);
        if decision.entry.limit.is_unlimited() {
            debug!(account = %decision.entry.account, "unlimited account, skipping usage check");
            return decision;
        }

        let ceiling = decision.entry.limit.ceiling();
        let percent = ceiling.map_or(0, |ceiling| percent_used(usage, ceiling));
        debug!(
            account = %decision.entry.account,
            usage,
            limit = %decision.entry.limit,
            percent,
            "checking usage"
        );

        match ceiling {
            Some(ceiling) if usage > ceiling => {
                let account = decision.entry.account.clone();
                decision.effect(SideEffect::hold(&account));
                // Repeat holds are re-applied but only the first is logged.
                if !decision.entry.limit_reached_notified {
                    decision.event(LedgerEvent::Held);
                    let notice = Notice::LimitReached {
                        period_start: decision.entry.period_start,
                    };
                    decision.effect(SideEffect::notify(&account, notice));
                    decision.entry.limit_reached_notified = true;
                    decision.event(LedgerEvent::LimitReachedNotified);
                }
            }
            _ if percent >= self.policy.near_limit_percent
                && !decision.entry.near_limit_notified =>
            {
                let notice = Notice::NearLimit {
                    percent,
                    period_start: decision.entry.period_start,
                };
                let account = decision.entry.account.clone();
                decision.effect(SideEffect::notify(account, notice));
                decision.entry.near_limit_notified = true;
                decision.event(LedgerEvent::NearLimitNotified { percent });
            }
            _ => {}
        }
        decision
    }

    /// Lifts the hold once usage is genuinely below the limit.
    ///
    /// Compared on the integer encoding: an unlimited (`-1`) or disabled
    /// account never qualifies.
    pub fn release_hold(
        &self,
        entry: AccountLedgerEntry,
        usage: u64,
    ) -> Result<Decision, CoreError> {
        let below = i64::try_from(usage).is_ok_and(|usage| usage < entry.limit.raw());
        if !below {
            return Err(CoreError::UsageExceedsLimit {
                account: entry.account,
                usage,
                limit: entry.limit,
            });
        }
        let mut decision = Decision::keep(entry);
        decision.effect(SideEffect::release(decision.entry.account.clone()));
        decision.event(LedgerEvent::Released);
        Ok(decision)
    }

    /// Zeroes recorded usage and starts a fresh period with the same limit.
    pub fn reset_usage(&self, entry: AccountLedgerEntry, today: NaiveDate) -> Decision {
        let mut decision = Decision::keep(entry);
        decision.effect(SideEffect::reset_usage(decision.entry.account.clone()));
        decision.entry.begin_period(today);
        decision.event(LedgerEvent::UsageReset);
        decision
    }

    /// Starts a new period once the current one has run its course.
    ///
    /// Limited accounts get the default grant back; unlimited and disabled
    /// accounts only move their period start.
    pub fn rollover(&self, entry: AccountLedgerEntry, today: NaiveDate) -> Decision {
        let mut decision = Decision::keep(entry);
        let elapsed = decision.entry.elapsed_days(today);
        if elapsed <= i64::from(self.policy.period_days) {
            return decision;
        }

        if decision.entry.limit.is_unlimited() || decision.entry.limit.is_disabled() {
            decision.event(LedgerEvent::PeriodAdvanced);
        } else {
            decision.entry.limit = Limit::Units(self.policy.default_grant);
            decision.event(LedgerEvent::PeriodReset {
                grant: self.policy.default_grant,
            });
        }
        decision.entry.begin_period(today);
        decision.effect(SideEffect::reset_usage(decision.entry.account.clone()));
        debug!(account = %decision.entry.account, elapsed, "period rolled over");
        decision
    }

    /// Warns the account ahead of the rollover.
    ///
    /// Fires only when exactly `pre_expiry_days` remain, so callers run it once a day.
    pub fn pre_expiry_notice(&self, entry: AccountLedgerEntry, today: NaiveDate) -> Decision {
        let mut decision = Decision::keep(entry);
        if decision.entry.limit.is_unlimited() {
            return decision;
        }
        let end_date = decision.entry.period_end(self.policy.period_days);
        let remaining = (end_date - today).num_days();
        if remaining == i64::from(self.policy.pre_expiry_days) {
            let account = decision.entry.account.clone();
            decision.effect(SideEffect::notify(
                account,
                Notice::UpcomingRollover { end_date },
            ));
            decision.event(LedgerEvent::RolloverNoticeSent { end_date });
        }
        decision
    }
}

fn warn_if_unlimited(decision: &mut Decision, limit: Limit) {
    if limit.is_unlimited() {
        decision
            .advisories
            .push(format!("giving account {} unlimited SUs", decision.entry.account));
    }
}
