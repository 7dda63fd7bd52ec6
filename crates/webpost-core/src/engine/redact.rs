//! Masking of credential-bearing form fields and headers in logs.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Keys (case-insensitive) whose values never appear in logs.
pub const SENSITIVE_KEYS: [&str; 6] = [
    "password",
    "passwd",
    "pass",
    "authorization",
    "cookie",
    "set-cookie",
];

pub const MASK: &str = "********";

pub fn is_sensitive(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lower.as_str())
}

pub fn mask_value(key: &str, value: &str) -> String {
    if is_sensitive(key) {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

/// Mask form pairs, keeping order. Serialized as `[[key, value], ...]`.
pub fn mask_pairs(pairs: &[(String, String)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), Value::String(mask_value(k, v))]))
            .collect(),
    )
}

pub fn mask_map(map: &BTreeMap<String, String>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), Value::String(mask_value(k, v))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mask_pairs_is_case_insensitive() {
        let pairs = vec![
            ("user".to_string(), "alice".to_string()),
            ("Password".to_string(), "hunter2".to_string()),
            ("pass".to_string(), "x".to_string()),
        ];
        assert_eq!(
            mask_pairs(&pairs),
            json!([["user", "alice"], ["Password", MASK], ["pass", MASK]])
        );
    }

    #[test]
    fn test_mask_map_hides_cookie_headers() {
        let headers = BTreeMap::from([
            ("set-cookie".to_string(), "sid=1".to_string()),
            ("content-type".to_string(), "text/html".to_string()),
        ]);
        let masked = mask_map(&headers);
        assert_eq!(masked["set-cookie"], MASK);
        assert_eq!(masked["content-type"], "text/html");
    }
}
