//! Backup documents for the whole ledger.
//!
//! Exports are written with typed fields. Restores are lenient about how a
//! value is spelled, since backups pass through text and older dumps used
//! different field names, but strict about values being present.

use std::collections::HashSet;

use bank_domain::{AccountLedgerEntry, Limit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CoreError;

const LIMIT_KEYS: &[&str] = &["limit", "su_limit_hrs"];
const PERIOD_START_KEYS: &[&str] = &["period_start", "date"];
const NEAR_LIMIT_KEYS: &[&str] = &["near_limit_notified", "percent_informed"];
const LIMIT_REACHED_KEYS: &[&str] = &["limit_reached_notified", "limit_informed"];

/// Serialized form of a full ledger backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerExport {
    pub count: usize,
    pub results: Vec<AccountLedgerEntry>,
}

impl LedgerExport {
    pub fn new(results: Vec<AccountLedgerEntry>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|err| CoreError::Serde(err.to_string()))
    }
}

/// Parses a backup document into ledger entries.
///
/// Accepts either `{"results": [...]}` or a bare array of records.
pub fn parse_export(raw: &str) -> Result<Vec<AccountLedgerEntry>, CoreError> {
    let parsed: Value = serde_json::from_str(raw.trim())
        .map_err(|err| CoreError::Format(format!("invalid JSON ({err})")))?;
    let records = match &parsed {
        Value::Array(items) => items,
        Value::Object(root) => root
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::Format("missing `results` array".into()))?,
        _ => {
            return Err(CoreError::Format(
                "backup must be an object or an array".into(),
            ))
        }
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let entry = parse_record(record).map_err(|detail| {
            CoreError::Format(format!("record {index}: {detail}"))
        })?;
        if !seen.insert(entry.account.clone()) {
            return Err(CoreError::Format(format!(
                "record {index}: account {} appears more than once",
                entry.account
            )));
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn parse_record(value: &Value) -> Result<AccountLedgerEntry, String> {
    let obj = value.as_object().ok_or("not an object")?;

    let account = obj
        .get("account")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|account| !account.is_empty())
        .ok_or("missing `account`")?
        .to_string();

    let raw_limit = field(obj, LIMIT_KEYS).ok_or("missing `limit`")?;
    let limit = coerce_integer(raw_limit)
        .ok_or_else(|| format!("`limit` is not an integer: {raw_limit}"))?;
    let limit = Limit::from_raw(limit).map_err(|err| err.to_string())?;

    let raw_start = field(obj, PERIOD_START_KEYS).ok_or("missing `period_start`")?;
    let period_start = coerce_date(raw_start)
        .ok_or_else(|| format!("`period_start` is not a date: {raw_start}"))?;

    Ok(AccountLedgerEntry {
        account,
        limit,
        period_start,
        near_limit_notified: coerce_flag(obj, NEAR_LIMIT_KEYS)?,
        limit_reached_notified: coerce_flag(obj, LIMIT_REACHED_KEYS)?,
    })
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn coerce_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    let date_part = text.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn coerce_flag(obj: &Map<String, Value>, keys: &[&str]) -> Result<bool, String> {
    let Some(value) = field(obj, keys) else {
        return Ok(false);
    };
    let parsed = match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| format!("`{}` is not a boolean: {value}", keys[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn export_document_round_trips() {
        let mut held = AccountLedgerEntry::new("grpB", Limit::Units(12_000), date(2024, 12, 31));
        held.limit_reached_notified = true;
        let entries = vec![
            AccountLedgerEntry::new("grpA", Limit::Unlimited, date(2025, 1, 2)),
            held,
        ];

        let json = LedgerExport::new(entries.clone()).to_json().unwrap();
        assert!(json.contains("\"count\": 2"));
        assert_eq!(parse_export(&json).unwrap(), entries);
    }

    #[test]
    fn coerces_text_encoded_values() {
        let raw = r#"{"count": 1, "results": [{
            "id": 4,
            "account": "grpC",
            "su_limit_hrs": "25000",
            "date": "2023-07-04T00:00:00",
            "percent_informed": 1,
            "limit_informed": "false"
        }]}"#;

        let entries = parse_export(raw).unwrap();
        assert_eq!(
            entries,
            vec![AccountLedgerEntry {
                account: "grpC".into(),
                limit: Limit::Units(25_000),
                period_start: date(2023, 7, 4),
                near_limit_notified: true,
                limit_reached_notified: false,
            }]
        );
    }

    #[test]
    fn accepts_integral_floats_and_bare_arrays() {
        let raw = r#"[{"account": "grpD", "limit": 10000.0, "period_start": "2025-02-01"}]"#;
        let entries = parse_export(raw).unwrap();
        assert_eq!(entries[0].limit, Limit::Units(10_000));
        assert!(!entries[0].near_limit_notified);
    }

    #[test]
    fn rejects_missing_required_fields() {
        let cases = [
            r#"{"results": [{"limit": 10000, "period_start": "2025-01-01"}]}"#,
            r#"{"results": [{"account": "a", "period_start": "2025-01-01"}]}"#,
            r#"{"results": [{"account": "a", "limit": 10000}]}"#,
            r#"{"results": [{"account": "a", "limit": 10000, "period_start": "01/02/2025"}]}"#,
            r#"{"results": [{"account": "a", "limit": -5, "period_start": "2025-01-01"}]}"#,
            r#"{"results": [{"account": "a", "limit": 10000.5, "period_start": "2025-01-01"}]}"#,
            r#"{"results": [{"account": "a", "limit": 1, "period_start": "2025-01-01", "limit_reached_notified": "maybe"}]}"#,
            r#"{"count": 0}"#,
            "not json",
        ];
        for raw in cases {
            let err = parse_export(raw).expect_err(raw);
            assert!(matches!(err, CoreError::Format(_)), "{raw}: {err:?}");
        }
    }

    #[test]
    fn rejects_duplicate_accounts() {
        let raw = r#"[
            {"account": "grpA", "limit": 10000, "period_start": "2025-01-01"},
            {"account": "grpA", "limit": 20000, "period_start": "2025-01-01"}
        ]"#;
        let err = parse_export(raw).expect_err("duplicate");
        assert!(err.to_string().contains("more than once"));
    }
}
