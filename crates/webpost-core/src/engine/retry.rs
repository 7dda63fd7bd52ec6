//! Retry budget and on_error routing.
//!
//! Stateless: the executor owns the per-step attempt counters and passes
//! them in.

use std::time::Duration;

use serde_json::json;
use webpost_types::step::{OnErrorAction, RetryPolicy, Step};

use crate::logging::Logger;

use super::condition::ConditionEvaluator;
use super::template::RenderSources;

// ---------------------------------------------------------------------------
// RetryHandler
// ---------------------------------------------------------------------------

/// Stateless retry decisions for failed steps.
pub struct RetryHandler;

impl RetryHandler {
    /// Whether another attempt is allowed after `retries_so_far` retries.
    pub fn should_retry(policy: &RetryPolicy, retries_so_far: u32) -> bool {
        retries_so_far < policy.max
    }

    /// Wait before retry number `retries_so_far + 1`.
    ///
    /// Indexes `backoff_sec` by attempt, reusing the last entry once the list
    /// runs out. Negative or non-finite entries wait zero; values too large
    /// for a `Duration` saturate at `Duration::MAX`.
    pub fn backoff(policy: &RetryPolicy, retries_so_far: u32) -> Duration {
        let Some(last_idx) = policy.backoff_sec.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        let idx = (retries_so_far as usize).min(last_idx);
        let secs = policy.backoff_sec[idx];
        if secs.is_finite() && secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// Action used when no on_error rule matches.
    pub fn default_action(policy: &RetryPolicy) -> OnErrorAction {
        if policy.max > 0 {
            OnErrorAction::Retry
        } else {
            OnErrorAction::Abort
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorRouter
// ---------------------------------------------------------------------------

/// Routing decision for a failed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub action: OnErrorAction,
    pub goto_step_id: Option<String>,
    /// Index of the matching rule; `None` when the default applied.
    pub rule_index: Option<usize>,
}

/// Picks the on_error action for a failed step.
pub struct ErrorRouter;

impl ErrorRouter {
    /// First rule whose `when_expr` is absent or evaluates true wins. A rule
    /// whose expression fails to render counts as not matching.
    pub fn resolve(step: &Step, src: &RenderSources<'_>, logger: &dyn Logger) -> RouteDecision {
        for (idx, rule) in step.on_error.iter().enumerate() {
            let matched = match rule.when_expr.as_deref() {
                None => true,
                Some(expr) => match ConditionEvaluator::evaluate(expr, src) {
                    Ok(matched) => matched,
                    Err(e) => {
                        logger.error(
                            "on_error.eval_failed",
                            json!({"step_id": step.id, "expr": expr, "error": e.to_string()}),
                        );
                        false
                    }
                },
            };
            if matched {
                return RouteDecision {
                    action: rule.action,
                    goto_step_id: rule.goto_step_id.clone(),
                    rule_index: Some(idx),
                };
            }
        }

        RouteDecision {
            action: RetryHandler::default_action(&step.retry),
            goto_step_id: None,
            rule_index: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingLogger;
    use serde_json::{Map, Value};
    use webpost_types::step::{LogStep, OnErrorRule, StepKind};

    fn policy(max: u32, backoff_sec: Vec<f64>) -> RetryPolicy {
        RetryPolicy { max, backoff_sec }
    }

    fn make_step(retry: RetryPolicy, on_error: Vec<OnErrorRule>) -> Step {
        Step {
            id: "s1".to_string(),
            name: "s1".to_string(),
            enabled: true,
            retry,
            on_error,
            kind: StepKind::Log(LogStep {
                message: "hi".to_string(),
                level: Default::default(),
                fields: Map::new(),
            }),
        }
    }

    fn rule(expr: Option<&str>, action: OnErrorAction, goto: Option<&str>) -> OnErrorRule {
        OnErrorRule {
            when_expr: expr.map(str::to_string),
            action,
            goto_step_id: goto.map(str::to_string),
        }
    }

    fn sources<'a>(vars: &'a Map<String, Value>, empty: &'a Map<String, Value>) -> RenderSources<'a> {
        RenderSources {
            vars,
            state: empty,
            secrets: empty,
            last: None,
        }
    }

    // -----------------------------------------------------------------------
    // RetryHandler
    // -----------------------------------------------------------------------

    #[test]
    fn test_should_retry_within_limit() {
        let p = policy(2, vec![]);
        assert!(RetryHandler::should_retry(&p, 0));
        assert!(RetryHandler::should_retry(&p, 1));
        assert!(!RetryHandler::should_retry(&p, 2));
        assert!(!RetryHandler::should_retry(&policy(0, vec![]), 0));
    }

    #[test]
    fn test_backoff_indexes_and_clamps_to_last() {
        let p = policy(5, vec![1.0, 2.5]);
        assert_eq!(RetryHandler::backoff(&p, 0), Duration::from_secs(1));
        assert_eq!(RetryHandler::backoff(&p, 1), Duration::from_millis(2500));
        assert_eq!(RetryHandler::backoff(&p, 4), Duration::from_millis(2500));
    }

    #[test]
    fn test_backoff_empty_or_negative_is_zero() {
        assert_eq!(RetryHandler::backoff(&policy(3, vec![]), 0), Duration::ZERO);
        assert_eq!(RetryHandler::backoff(&policy(3, vec![-1.0]), 0), Duration::ZERO);
    }

    #[test]
    fn test_backoff_overflow_saturates() {
        assert_eq!(RetryHandler::backoff(&policy(1, vec![1e20]), 0), Duration::MAX);
    }

    #[test]
    fn test_default_action_depends_on_max() {
        assert_eq!(RetryHandler::default_action(&policy(1, vec![])), OnErrorAction::Retry);
        assert_eq!(RetryHandler::default_action(&policy(0, vec![])), OnErrorAction::Abort);
    }

    // -----------------------------------------------------------------------
    // ErrorRouter
    // -----------------------------------------------------------------------

    #[test]
    fn test_first_matching_rule_wins() {
        let vars = serde_json::json!({"code": "503"}).as_object().cloned().unwrap_or_default();
        let empty = Map::new();
        let step = make_step(
            RetryPolicy::default(),
            vec![
                rule(Some("${vars.code}==500"), OnErrorAction::Abort, None),
                rule(Some("${vars.code}==503"), OnErrorAction::Goto, Some("login")),
                rule(None, OnErrorAction::Retry, None),
            ],
        );
        let logger = RecordingLogger::new();
        let decision = ErrorRouter::resolve(&step, &sources(&vars, &empty), &logger);
        assert_eq!(decision.action, OnErrorAction::Goto);
        assert_eq!(decision.goto_step_id.as_deref(), Some("login"));
        assert_eq!(decision.rule_index, Some(1));
    }

    #[test]
    fn test_unconditional_rule_matches() {
        let empty = Map::new();
        let step = make_step(RetryPolicy::default(), vec![rule(None, OnErrorAction::Retry, None)]);
        let decision = ErrorRouter::resolve(&step, &sources(&empty, &empty), &RecordingLogger::new());
        assert_eq!(decision.action, OnErrorAction::Retry);
    }

    #[test]
    fn test_no_match_falls_back_to_default() {
        let empty = Map::new();
        let step = make_step(
            policy(2, vec![]),
            vec![rule(Some("0"), OnErrorAction::Goto, Some("x"))],
        );
        let decision = ErrorRouter::resolve(&step, &sources(&empty, &empty), &RecordingLogger::new());
        assert_eq!(decision.action, OnErrorAction::Retry);
        assert_eq!(decision.rule_index, None);

        let no_rules = make_step(RetryPolicy::default(), vec![]);
        let decision = ErrorRouter::resolve(&no_rules, &sources(&empty, &empty), &RecordingLogger::new());
        assert_eq!(decision.action, OnErrorAction::Abort);
    }

    #[test]
    fn test_render_error_counts_as_no_match_and_is_logged() {
        let empty = Map::new();
        let step = make_step(
            RetryPolicy::default(),
            vec![
                rule(Some("${bogus.x}"), OnErrorAction::Retry, None),
                rule(None, OnErrorAction::Abort, None),
            ],
        );
        let logger = RecordingLogger::new();
        let decision = ErrorRouter::resolve(&step, &sources(&empty, &empty), &logger);
        assert_eq!(decision.action, OnErrorAction::Abort);
        assert_eq!(logger.events_named("on_error.eval_failed").len(), 1);
    }
}
