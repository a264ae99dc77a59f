//! Allocation ceilings and their integer encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw value that stands for an unlimited allocation.
pub const UNLIMITED_RAW: i64 = -1;

/// Raw value that stands for a disabled allocation.
pub const DISABLED_RAW: i64 = 0;

/// Allocation ceiling for an account, in service units.
///
/// Persisted and exported as a plain integer: `-1` is unlimited, `0` is a
/// disabled account, anything positive is a real ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Limit {
    Unlimited,
    Disabled,
    Units(u64),
}

impl Limit {
    /// Decodes the integer representation, rejecting negatives other than `-1`.
    pub fn from_raw(raw: i64) -> Result<Self, LimitError> {
        match raw {
            UNLIMITED_RAW => Ok(Limit::Unlimited),
            DISABLED_RAW => Ok(Limit::Disabled),
            value if value > 0 => Ok(Limit::Units(value as u64)),
            value => Err(LimitError::Negative(value)),
        }
    }

    pub fn raw(self) -> i64 {
        match self {
            Limit::Unlimited => UNLIMITED_RAW,
            Limit::Disabled => DISABLED_RAW,
            Limit::Units(value) => i64::try_from(value).unwrap_or(i64::MAX),
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    /// A zero ceiling, whether spelled `Disabled` or `Units(0)`.
    pub fn is_disabled(self) -> bool {
        matches!(self, Limit::Disabled | Limit::Units(0))
    }

    /// Returns the enforceable ceiling, if this limit has one.
    pub fn ceiling(self) -> Option<u64> {
        match self {
            Limit::Units(value) if value > 0 => Some(value),
            _ => None,
        }
    }

    /// Adds `delta` on the integer encoding, so `-1` on either side counts
    /// as minus one rather than as unlimited.
    pub fn checked_add(self, delta: Limit) -> Result<Limit, LimitError> {
        Limit::from_raw(self.raw().saturating_add(delta.raw()))
    }
}

impl TryFrom<i64> for Limit {
    type Error = LimitError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Limit::from_raw(value)
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        limit.raw()
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unlimited => f.write_str("unlimited"),
            other => write!(f, "{}", other.raw()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised when decoding a [`Limit`] from its integer form.
pub enum LimitError {
    Negative(i64),
}

impl fmt::Display for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitError::Negative(value) => {
                write!(f, "limit {value} is negative; only -1 (unlimited) is allowed")
            }
        }
    }
}

impl std::error::Error for LimitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_map_to_variants() {
        assert_eq!(Limit::from_raw(-1), Ok(Limit::Unlimited));
        assert_eq!(Limit::from_raw(0), Ok(Limit::Disabled));
        assert_eq!(Limit::from_raw(10_000), Ok(Limit::Units(10_000)));
        assert_eq!(Limit::from_raw(-7), Err(LimitError::Negative(-7)));
    }

    #[test]
    fn checked_add_sums_integer_encodings() {
        assert_eq!(
            Limit::Units(10_000).checked_add(Limit::Units(5_000)),
            Ok(Limit::Units(15_000))
        );
        assert_eq!(
            Limit::Unlimited.checked_add(Limit::Units(10_000)),
            Ok(Limit::Units(9_999))
        );
        assert_eq!(
            Limit::Units(20_000).checked_add(Limit::Unlimited),
            Ok(Limit::Units(19_999))
        );
        assert_eq!(
            Limit::Disabled.checked_add(Limit::Units(12_000)),
            Ok(Limit::Units(12_000))
        );
        assert_eq!(
            Limit::Disabled.checked_add(Limit::Unlimited),
            Ok(Limit::Unlimited)
        );
        assert_eq!(
            Limit::Unlimited.checked_add(Limit::Unlimited),
            Err(LimitError::Negative(-2))
        );
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&Limit::Unlimited).unwrap();
        assert_eq!(json, "-1");
        let parsed: Limit = serde_json::from_str("25000").unwrap();
        assert_eq!(parsed, Limit::Units(25_000));
        assert!(serde_json::from_str::<Limit>("-3").is_err());
    }
}
