//! Boolean condition evaluation for assert steps and on_error rules.
//!
//! The expression is rendered first, then split on the first occurrence of
//! an operator in the order `==, >=, <=, >, <`. The split is textual, so an
//! operand that itself contains an operator token is misparsed; scenario
//! authors are expected to compare simple values.

use webpost_types::error::TemplateError;

use super::template::{RenderSources, TemplateRenderer};

const OPERATORS: [&str; 5] = ["==", ">=", "<=", ">", "<"];

/// Stateless condition evaluator.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Render `expr` against `src` and evaluate it.
    pub fn evaluate(expr: &str, src: &RenderSources<'_>) -> Result<bool, TemplateError> {
        let rendered = TemplateRenderer::render_str(expr, src)?;
        Ok(Self::evaluate_rendered(&rendered))
    }

    /// Evaluate an already-rendered expression.
    pub fn evaluate_rendered(rendered: &str) -> bool {
        for op in OPERATORS {
            if let Some((left, right)) = rendered.split_once(op) {
                return compare(op, left.trim(), right.trim());
            }
        }
        is_truthy(rendered)
    }
}

fn compare(op: &str, left: &str, right: &str) -> bool {
    if op == "==" {
        return left == right;
    }
    let (Ok(l), Ok(r)) = (left.parse::<f64>(), right.parse::<f64>()) else {
        return false;
    };
    match op {
        ">=" => l >= r,
        "<=" => l <= r,
        ">" => l > r,
        "<" => l < r,
        _ => false,
    }
}

fn is_truthy(rendered: &str) -> bool {
    !matches!(rendered.to_lowercase().as_str(), "" | "false" | "0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    #[test]
    fn test_equality_trims_sides() {
        assert!(ConditionEvaluator::evaluate_rendered("200 == 200"));
        assert!(!ConditionEvaluator::evaluate_rendered("200==302"));
        assert!(ConditionEvaluator::evaluate_rendered("abc==abc"));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(ConditionEvaluator::evaluate_rendered("500>=500"));
        assert!(ConditionEvaluator::evaluate_rendered("2.5<3"));
        assert!(ConditionEvaluator::evaluate_rendered("10>9"));
        assert!(!ConditionEvaluator::evaluate_rendered("10<=9"));
    }

    #[test]
    fn test_numeric_parse_failure_is_false() {
        assert!(!ConditionEvaluator::evaluate_rendered(">=500"));
        assert!(!ConditionEvaluator::evaluate_rendered("abc>1"));
    }

    #[test]
    fn test_truthiness() {
        assert!(ConditionEvaluator::evaluate_rendered("yes"));
        assert!(ConditionEvaluator::evaluate_rendered("1"));
        assert!(!ConditionEvaluator::evaluate_rendered(""));
        assert!(!ConditionEvaluator::evaluate_rendered("FALSE"));
        assert!(!ConditionEvaluator::evaluate_rendered("0"));
        // Not trimmed before the truthiness check.
        assert!(ConditionEvaluator::evaluate_rendered(" 0"));
    }

    #[test]
    fn test_first_operator_wins_naive_split() {
        // "a>=b==c" splits on "==" first: "a>=b" vs "c".
        assert!(!ConditionEvaluator::evaluate_rendered("1>=0==true"));
        assert!(ConditionEvaluator::evaluate_rendered("x>=y==x>=y"));
    }

    #[test]
    fn test_evaluate_renders_templates() {
        let vars = json!({"count": 3}).as_object().cloned().unwrap_or_default();
        let empty = Map::<String, Value>::new();
        let src = RenderSources {
            vars: &vars,
            state: &empty,
            secrets: &empty,
            last: None,
        };
        assert!(ConditionEvaluator::evaluate("${vars.count}>2", &src).unwrap());
        assert!(!ConditionEvaluator::evaluate("${vars.missing}", &src).unwrap());
        assert!(ConditionEvaluator::evaluate("${nope.x}", &src).is_err());
    }
}
