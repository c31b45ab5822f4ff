//! Lenient scalar decoding.
//!
//! Hand-written YAML often leaves versions, ports and flags unquoted
//! (`version: 1.0`, `port: 5432`, `enabled: yes`). Fields typed as strings
//! accept any scalar and keep its textual form; null becomes empty.
//!
//! Numbers are rendered from their parsed value, not the source text, so an
//! unquoted `version: 1.10` reads back as `"1.1"`. Quote versions to keep
//! them verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Render a scalar YAML value as text. Sequences and mappings yield `None`.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => to_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn text_or_error<E: serde::de::Error>(value: &Value) -> Result<String, E> {
    to_text(value).ok_or_else(|| E::custom("expected a scalar value, found a sequence or mapping"))
}

/// Deserialize a string field from any scalar.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    text_or_error(&value)
}

/// Deserialize a `key -> scalar` map, such as tags.
pub fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| text_or_error(&value).map(|text| (key, text)))
        .collect()
}

/// Deserialize the two-level secrets table.
pub fn nested_string_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<BTreeMap<String, Value>>>>::deserialize(deserializer)?;
    let mut groups = BTreeMap::new();
    for (group, entries) in raw.unwrap_or_default() {
        let mut decoded = BTreeMap::new();
        for (key, value) in entries.unwrap_or_default() {
            decoded.insert(key, text_or_error(&value)?);
        }
        groups.insert(group, decoded);
    }
    Ok(groups)
}

/// Deserialize a boolean from `true`/`false`, `yes`/`no`, `1`/`0` or null.
pub fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().map(|v| v != 0).unwrap_or(false)),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Ok(true),
            "false" | "0" | "no" | "n" | "" => Ok(false),
            other => Err(D::Error::custom(format!("cannot convert '{other}' to boolean"))),
        },
        other => Err(D::Error::custom(format!("cannot convert {other:?} to boolean"))),
    }
}

/// Deserialize a list of names, tolerating null.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    raw.unwrap_or_default().iter().map(text_or_error).collect()
}

/// Deserialize a sequence of records, tolerating null.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "string")]
        text: String,
        #[serde(default, deserialize_with = "boolean")]
        flag: bool,
        #[serde(default, deserialize_with = "string_map")]
        tags: BTreeMap<String, String>,
    }

    #[test]
    fn test_numbers_and_bools_become_text() {
        let sample: Sample = serde_yaml::from_str("text: 1.5\nflag: yes\ntags: {port: 5432, on: true}").unwrap();
        assert_eq!(sample.text, "1.5");
        assert!(sample.flag);
        assert_eq!(sample.tags.get("port").map(String::as_str), Some("5432"));
        assert_eq!(sample.tags.get("on").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_unquoted_numbers_lose_trailing_zeros() {
        let sample: Sample = serde_yaml::from_str("text: 1.10").unwrap();
        assert_eq!(sample.text, "1.1");

        let sample: Sample = serde_yaml::from_str("text: \"1.10\"").unwrap();
        assert_eq!(sample.text, "1.10");
    }

    #[test]
    fn test_null_becomes_empty() {
        let sample: Sample = serde_yaml::from_str("text: ~\nflag: ~\ntags: ~").unwrap();
        assert!(sample.text.is_empty());
        assert!(!sample.flag);
        assert!(sample.tags.is_empty());
    }

    #[test]
    fn test_mapping_rejected_for_string() {
        let result: Result<Sample, _> = serde_yaml::from_str("text: {a: b}");
        assert!(result.is_err());
    }
}
