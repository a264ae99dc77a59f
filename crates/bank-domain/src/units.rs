//! Conversions between the cluster's raw usage and ledger service units.

/// Raw usage is reported in CPU-seconds; the ledger counts CPU-hours.
pub const SECONDS_PER_HOUR: u64 = 60 * 60;

/// Converts raw CPU-seconds into whole service units, rounding down.
pub fn service_units_from_seconds(raw_seconds: u64) -> u64 {
    raw_seconds / SECONDS_PER_HOUR
}

/// Integer percentage of `ceiling` consumed by `usage`, rounded down.
///
/// A zero ceiling reports zero percent.
pub fn percent_used(usage: u64, ceiling: u64) -> u64 {
    if ceiling == 0 {
        return 0;
    }
    let percent = (usage as u128 * 100) / ceiling as u128;
    u64::try_from(percent).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_rounds_down() {
        assert_eq!(service_units_from_seconds(36_000), 10);
        assert_eq!(service_units_from_seconds(3_599), 0);
        assert_eq!(service_units_from_seconds(7_199), 1);
    }

    #[test]
    fn percent_is_floored() {
        assert_eq!(percent_used(8_999, 10_000), 89);
        assert_eq!(percent_used(9_000, 10_000), 90);
        assert_eq!(percent_used(5, 0), 0);
        assert_eq!(percent_used(u64::MAX, 1), u64::MAX);
    }
}
