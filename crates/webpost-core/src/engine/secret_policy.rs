//! Guard that keeps secret templates out of log steps.

use serde_json::Value;
use thiserror::Error;

use super::template::expression_roots;

/// Template root that would expand a secret.
pub const FORBIDDEN_ROOT: &str = "secrets";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Secret template usage is not allowed in log steps")]
pub struct SecretTemplateError;

pub struct SecretTemplatePolicy;

impl SecretTemplatePolicy {
    /// Reject `value` if any string inside it (recursively, object values
    /// and list items) references `secrets`.
    pub fn assert_safe(value: &Value) -> Result<(), SecretTemplateError> {
        if Self::contains_secret_template(value) {
            Err(SecretTemplateError)
        } else {
            Ok(())
        }
    }

    pub fn assert_safe_str(value: &str) -> Result<(), SecretTemplateError> {
        if Self::references_secrets(value) {
            Err(SecretTemplateError)
        } else {
            Ok(())
        }
    }

    pub fn contains_secret_template(value: &Value) -> bool {
        match value {
            Value::String(s) => Self::references_secrets(s),
            Value::Array(items) => items.iter().any(Self::contains_secret_template),
            Value::Object(map) => map.values().any(Self::contains_secret_template),
            _ => false,
        }
    }

    fn references_secrets(template: &str) -> bool {
        expression_roots(template).contains(&FORBIDDEN_ROOT)
    }
}
