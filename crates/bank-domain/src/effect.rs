//! Side-effect requests emitted by the allocation engine.
//!
//! The engine never talks to the cluster or the mail system. It hands back
//! these requests and the caller fans them out to the configured clusters.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Administrative actions applied to an account on every configured cluster.
pub enum EnforcementAction {
    Hold,
    Release,
    ResetUsage,
}

impl fmt::Display for EnforcementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnforcementAction::Hold => "hold",
            EnforcementAction::Release => "release",
            EnforcementAction::ResetUsage => "reset-usage",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Messages delivered to the account's responsible party.
pub enum Notice {
    /// The allocation is exhausted and the account has been held.
    LimitReached { period_start: NaiveDate },
    /// Usage crossed the near-limit threshold.
    NearLimit { percent: u64, period_start: NaiveDate },
    /// The current period ends soon and the grant will be replaced.
    UpcomingRollover { end_date: NaiveDate },
}

impl Notice {
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::LimitReached { .. } => "limit-reached",
            Notice::NearLimit { .. } => "near-limit",
            Notice::UpcomingRollover { .. } => "upcoming-rollover",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A request produced by a decision, executed by the actuator or notifier.
pub enum SideEffect {
    Enforce {
        account: String,
        action: EnforcementAction,
    },
    Notify {
        account: String,
        notice: Notice,
    },
}

impl SideEffect {
    pub fn hold(account: impl Into<String>) -> Self {
        Self::enforce(account, EnforcementAction::Hold)
    }

    pub fn release(account: impl Into<String>) -> Self {
        Self::enforce(account, EnforcementAction::Release)
    }

    pub fn reset_usage(account: impl Into<String>) -> Self {
        Self::enforce(account, EnforcementAction::ResetUsage)
    }

    pub fn notify(account: impl Into<String>, notice: Notice) -> Self {
        SideEffect::Notify {
            account: account.into(),
            notice,
        }
    }

    fn enforce(account: impl Into<String>, action: EnforcementAction) -> Self {
        SideEffect::Enforce {
            account: account.into(),
            action,
        }
    }

    pub fn action(&self) -> Option<EnforcementAction> {
        match self {
            SideEffect::Enforce { action, .. } => Some(*action),
            SideEffect::Notify { .. } => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            SideEffect::Notify { notice, .. } => Some(notice),
            SideEffect::Enforce { .. } => None,
        }
    }
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideEffect::Enforce { account, action } => write!(f, "{action} {account}"),
            SideEffect::Notify { account, notice } => {
                write!(f, "notify {account} ({})", notice.kind())
            }
        }
    }
}
