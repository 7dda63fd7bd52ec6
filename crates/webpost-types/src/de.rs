//! Lenient deserializers for hand-written scenario files.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Stringify a scalar the way a form encoder would.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accept `[[key, value], ...]` where values may be any YAML/JSON scalar.
///
/// Entries with fewer than two items are skipped; extra items are ignored.
pub(crate) fn form_list<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Vec<Value>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter(|item| item.len() >= 2)
        .map(|item| (scalar_to_string(&item[0]), scalar_to_string(&item[1])))
        .collect())
}

/// Accept either a string or a number and keep it as a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}
