//! Grant sizes, thresholds and period lengths that drive enforcement.

use bank_domain::Limit;

use crate::CoreError;

pub const DEFAULT_MIN_GRANT: u64 = 10_000;
pub const DEFAULT_GRANT: u64 = 10_000;
pub const DEFAULT_NEAR_LIMIT_PERCENT: u64 = 90;
pub const DEFAULT_PERIOD_DAYS: u32 = 365;
pub const DEFAULT_PRE_EXPIRY_DAYS: u32 = 90;

/// Tunables consulted by the [`crate::AllocationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPolicy {
    /// Smallest ceiling accepted on insert, modify and add.
    pub min_grant: u64,
    /// Ceiling applied to limited accounts when their period rolls over.
    pub default_grant: u64,
    /// Usage percentage that triggers the near-limit notice.
    pub near_limit_percent: u64,
    pub period_days: u32,
    /// Days before the period end on which the rollover notice goes out.
    pub pre_expiry_days: u32,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            min_grant: DEFAULT_MIN_GRANT,
            default_grant: DEFAULT_GRANT,
            near_limit_percent: DEFAULT_NEAR_LIMIT_PERCENT,
            period_days: DEFAULT_PERIOD_DAYS,
            pre_expiry_days: DEFAULT_PRE_EXPIRY_DAYS,
        }
    }
}

impl AllocationPolicy {
    /// Parses a user-supplied limit and applies [`Self::validate_limit`].
    pub fn parse_limit(&self, raw: &str) -> Result<Limit, CoreError> {
        let value: i64 = raw.trim().parse().map_err(|_| {
            CoreError::InvalidLimit(format!("the given limit `{}` is not an integer", raw.trim()))
        })?;
        self.validate_limit(value)
    }

    /// Accepts `-1` (unlimited) or anything at or above the minimum grant.
    pub fn validate_limit(&self, value: i64) -> Result<Limit, CoreError> {
        if value == -1 {
            return Ok(Limit::Unlimited);
        }
        match u64::try_from(value) {
            Ok(units) if units >= self.min_grant => Ok(Limit::Units(units)),
            _ => Err(CoreError::InvalidLimit(format!(
                "{} SUs is too small, the minimum grant is {}",
                value, self.min_grant
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_unlimited_and_minimum_grant() {
        let policy = AllocationPolicy::default();
        assert_eq!(policy.parse_limit("-1").unwrap(), Limit::Unlimited);
        assert_eq!(policy.parse_limit(" 10000 ").unwrap(), Limit::Units(10_000));
    }

    #[test]
    fn rejects_small_and_non_integer_limits() {
        let policy = AllocationPolicy::default();
        for raw in ["500", "0", "-2", "9999", "10k", "1.5e4", ""] {
            let err = policy.parse_limit(raw).expect_err(raw);
            assert!(matches!(err, CoreError::InvalidLimit(_)), "{raw}: {err:?}");
        }
    }
}
