//! Required-input validation.

use serde_json::{Map, Value};
use webpost_types::error::InputValidationError;
use webpost_types::scenario::Scenario;

pub struct ScenarioInputValidator;

impl ScenarioInputValidator {
    /// Fail when a required input is absent or null. Names are reported in
    /// declaration order.
    pub fn validate(scenario: &Scenario, vars: &Map<String, Value>) -> Result<(), InputValidationError> {
        let missing = scenario.missing_inputs(vars);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InputValidationError::MissingInputs(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario() -> Scenario {
        serde_json::from_value(json!({
            "meta": {"id": "login"},
            "inputs": {"required": ["user", "date"], "optional": ["note"]},
            "steps": []
        }))
        .unwrap()
    }

    #[test]
    fn test_all_required_present() {
        let vars = json!({"user": "a", "date": "2026-01-01"}).as_object().cloned().unwrap_or_default();
        assert!(ScenarioInputValidator::validate(&scenario(), &vars).is_ok());
    }

    #[test]
    fn test_missing_and_null_inputs_reported() {
        let vars = json!({"date": null, "note": "x"}).as_object().cloned().unwrap_or_default();
        let err = ScenarioInputValidator::validate(&scenario(), &vars).unwrap_err();
        assert_eq!(err.to_string(), "Missing required inputs: user, date");
    }
}
