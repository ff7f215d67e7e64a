//! Helpers for showing backend values that may be missing or oddly encoded.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";

#[must_use]
pub fn or_na<S: AsRef<str>>(value: Option<S>) -> String {
    match value {
        Some(value) if !value.as_ref().trim().is_empty() => value.as_ref().trim().to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[must_use]
pub fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |value| format!("{value:.2}"))
}

/// Keeps the date part of a backend timestamp (`2024-03-01T10:00:00Z` or
/// `2024-03-01 10:00:00`).
#[must_use]
pub fn date(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value
            .split(['T', ' '])
            .next()
            .unwrap_or(value)
            .to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default, alias = "title", alias = "label")]
    pub name: Option<String>,
    #[serde(default, alias = "price", alias = "value", deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
}

impl Fee {
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{}: {}", or_na(self.name.as_deref()), amount(self.amount))
    }
}

/// Reads a fee list that is either a JSON array or a string holding one.
#[must_use]
pub fn parse_fees(value: &Value) -> Vec<Fee> {
    match value {
        Value::Array(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
        Value::String(encoded) => serde_json::from_str::<Value>(encoded)
            .ok()
            .filter(Value::is_array)
            .map(|decoded| parse_fees(&decoded))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[must_use]
pub fn fees_total(fees: &[Fee]) -> f64 {
    fees.iter().filter_map(|fee| fee.amount).sum()
}

#[must_use]
pub fn describe_fees(fees: &[Fee]) -> String {
    if fees.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    fees.iter().map(Fee::describe).collect::<Vec<_>>().join(", ")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Other(Value),
}

/// Accepts `12.5`, `"12.50"` or nothing.
///
/// # Errors
///
/// Only fails when the underlying deserializer does.
pub fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Number(number)) => Some(number),
        Some(RawNumber::Text(text)) => text.trim().parse().ok(),
        Some(RawNumber::Other(_)) | None => None,
    })
}

/// Accepts `3`, `"3"`, `3.0` or nothing. Negative or fractional counts are
/// dropped.
///
/// # Errors
///
/// Only fails when the underlying deserializer does.
pub fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(lenient_amount(deserializer)?
        .filter(|count| *count >= 0.0 && count.fract() == 0.0)
        .map(|count| count as u64))
}

/// Accepts an array, `null` or nothing. Entries that do not fit `T` are
/// skipped.
///
/// # Errors
///
/// Only fails when the underlying deserializer does.
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts `true`, `1`, `"1"`, `"true"` and their negatives.
///
/// # Errors
///
/// Only fails when the underlying deserializer does.
pub fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(number)) => number.as_i64().map(|n| n != 0),
        Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_values() {
        assert_eq!(or_na(None::<&str>), "N/A");
        assert_eq!(or_na(Some("  ")), "N/A");
        assert_eq!(or_na(Some(" Tesla ")), "Tesla");
        assert_eq!(amount(None), "N/A");
        assert_eq!(amount(Some(12.5)), "12.50");
    }

    #[test]
    fn test_date_keeps_day() {
        assert_eq!(date(Some("2024-03-01T10:00:00.000000Z")), "2024-03-01");
        assert_eq!(date(Some("2024-03-01 10:00:00")), "2024-03-01");
        assert_eq!(date(Some("")), "N/A");
        assert_eq!(date(None), "N/A");
    }

    #[test]
    fn test_fees_from_encoded_string() {
        let fees = parse_fees(&json!(
            "[{\"name\":\"Cleaning\",\"amount\":\"15.00\"},{\"title\":\"Fuel\",\"price\":20}]"
        ));

        assert_eq!(fees.len(), 2);
        assert_eq!(fees[0].name.as_deref(), Some("Cleaning"));
        assert_eq!(fees[1].name.as_deref(), Some("Fuel"));
        assert!((fees_total(&fees) - 35.0).abs() < f64::EPSILON);
        assert_eq!(describe_fees(&fees), "Cleaning: 15.00, Fuel: 20.00");
    }

    #[test]
    fn test_fees_from_array() {
        let fees = parse_fees(&json!([{"name": "Delivery", "amount": 9.99}]));
        assert_eq!(fees[0].amount, Some(9.99));
    }

    #[test]
    fn test_fees_from_garbage() {
        assert!(parse_fees(&json!("not json")).is_empty());
        assert!(parse_fees(&json!("{\"name\":\"x\"}")).is_empty());
        assert!(parse_fees(&Value::Null).is_empty());
        assert_eq!(describe_fees(&[]), "N/A");
    }
}
