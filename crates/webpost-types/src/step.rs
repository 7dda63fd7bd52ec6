//! Step domain types.
//!
//! A scenario is an ordered list of [`Step`]s. Every step carries a common
//! header (id, enabled flag, retry policy, on_error rules) and a closed
//! [`StepKind`] payload. The kind is internally tagged by `type` so the
//! scenario file keeps a flat shape:
//!
//! ```yaml
//! - id: login_page
//!   type: http
//!   retry: { max: 2, backoff_sec: [1, 3] }
//!   request:
//!     method: GET
//!     url: /login
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A single unit of work in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique within a scenario; used as a goto target.
    pub id: String,
    /// Display name. The loader fills it with `id` when absent.
    #[serde(default)]
    pub name: String,
    /// Disabled steps are skipped without logging.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Retry budget for failures that resolve to `retry`.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Error routing rules, evaluated in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_error: Vec<OnErrorRule>,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    /// Short lowercase name of the step kind (`http`, `scrape`, ...).
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// Kind-specific step payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Issue an HTTP request and capture the response as `last`.
    Http(HttpStep),
    /// Extract values from the last response body.
    Scrape(ScrapeStep),
    /// Evaluate boolean conditions.
    Assert(AssertStep),
    /// Render fields into the run result.
    Result(ResultStep),
    /// Emit a structured log event.
    Log(LogStep),
}

impl StepKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            StepKind::Http(_) => "http",
            StepKind::Scrape(_) => "scrape",
            StepKind::Assert(_) => "assert",
            StepKind::Result(_) => "result",
            StepKind::Log(_) => "log",
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Retry / on_error policy
// ---------------------------------------------------------------------------

/// Per-step retry policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt (0 = no retry).
    #[serde(default)]
    pub max: u32,
    /// Wait before each retry, indexed by attempt. The last entry is reused
    /// once the list is exhausted.
    #[serde(default)]
    pub backoff_sec: Vec<f64>,
}

/// One error routing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnErrorRule {
    /// Condition expression; `None` matches unconditionally.
    #[serde(default, rename = "expr", alias = "when_expr")]
    pub when_expr: Option<String>,
    #[serde(default)]
    pub action: OnErrorAction,
    /// Required when `action` is `goto`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto_step_id: Option<String>,
}

/// What to do with a failed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnErrorAction {
    Retry,
    Goto,
    #[default]
    Abort,
}

impl fmt::Display for OnErrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnErrorAction::Retry => write!(f, "retry"),
            OnErrorAction::Goto => write!(f, "goto"),
            OnErrorAction::Abort => write!(f, "abort"),
        }
    }
}

// ---------------------------------------------------------------------------
// Http
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpStep {
    pub request: HttpRequestSpec,
}

/// Request template for an HTTP step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequestSpec {
    #[serde(default = "default_method")]
    pub method: String,
    /// Absolute URL or a path resolved against `defaults.http.base_url`.
    pub url: String,
    /// Header templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Ordered `[key, value]` form pairs; repeated keys are allowed.
    #[serde(default, deserialize_with = "crate::de::form_list")]
    pub form_list: Vec<(String, String)>,
    /// Name of a `vars` object whose pairs are merged ahead of `form_list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_from_vars: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

/// Scrape command payload.
///
/// `command` and `save_to` stay free-form strings so that an unsupported
/// value fails the step at run time instead of rejecting the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeStep {
    /// `hidden_inputs`, `css` or `label`.
    pub command: String,
    #[serde(default)]
    pub save_as: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    /// Attribute to read instead of element text (css).
    #[serde(default)]
    pub attr: Option<String>,
    /// Collect every match instead of the first (css).
    #[serde(default)]
    pub multiple: bool,
    /// Visible label text to search for (label).
    #[serde(default)]
    pub label: Option<String>,
    /// `vars` or `state`.
    #[serde(default = "default_save_to")]
    pub save_to: String,
}

fn default_save_to() -> String {
    "vars".to_string()
}

// ---------------------------------------------------------------------------
// Assert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertStep {
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub mode: AssertMode,
    /// Stop at the first failing condition (`all` mode only).
    #[serde(default = "default_true")]
    pub fail_fast: bool,
    /// Replaces the per-condition messages on failure.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub expr: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertMode {
    #[default]
    All,
    Any,
}

// ---------------------------------------------------------------------------
// Result / Log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultStep {
    /// Field templates upserted into the run result.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogStep {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Severity for run events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_step_from_yaml_with_defaults() {
        let yaml = r#"
id: login_page
type: http
request:
  url: /login
"#;
        let step: Step = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(step.id, "login_page");
        assert!(step.enabled);
        assert_eq!(step.retry, RetryPolicy::default());
        assert!(step.on_error.is_empty());
        match step.kind {
            StepKind::Http(http) => {
                assert_eq!(http.request.method, "GET");
                assert_eq!(http.request.url, "/login");
                assert!(http.request.form_list.is_empty());
            }
            other => panic!("expected http step, got {other:?}"),
        }
    }

    #[test]
    fn test_form_list_stringifies_scalars_and_skips_short_entries() {
        let yaml = r#"
id: submit
type: http
request:
  method: POST
  url: /login
  form_list:
    - [user, "${vars.user}"]
    - [count, 3]
    - [flag, true]
    - [orphan]
"#;
        let step: Step = serde_yaml_ng::from_str(yaml).unwrap();
        let StepKind::Http(http) = step.kind else {
            panic!("expected http step");
        };
        assert_eq!(
            http.request.form_list,
            vec![
                ("user".to_string(), "${vars.user}".to_string()),
                ("count".to_string(), "3".to_string()),
                ("flag".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_on_error_rule_uses_expr_key_and_abort_default() {
        let yaml = r#"
id: check
type: assert
conditions:
  - expr: "${last.status}==200"
on_error:
  - expr: "${last.status}==503"
    action: goto
    goto_step_id: login_page
  - {}
"#;
        let step: Step = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(step.on_error.len(), 2);
        assert_eq!(step.on_error[0].when_expr.as_deref(), Some("${last.status}==503"));
        assert_eq!(step.on_error[0].action, OnErrorAction::Goto);
        assert_eq!(step.on_error[0].goto_step_id.as_deref(), Some("login_page"));
        assert_eq!(step.on_error[1].when_expr, None);
        assert_eq!(step.on_error[1].action, OnErrorAction::Abort);
    }

    #[test]
    fn test_retry_backoff_accepts_integers() {
        let json = r#"{"id":"s","type":"log","message":"hi","retry":{"max":2,"backoff_sec":[1,2.5]}}"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.retry.max, 2);
        assert_eq!(step.retry.backoff_sec, vec![1.0, 2.5]);
        assert_eq!(step.type_name(), "log");
    }

    #[test]
    fn test_scrape_defaults() {
        let yaml = r#"
id: hidden
type: scrape
command: hidden_inputs
save_as: login_hidden
"#;
        let step: Step = serde_yaml_ng::from_str(yaml).unwrap();
        let StepKind::Scrape(scrape) = step.kind else {
            panic!("expected scrape step");
        };
        assert_eq!(scrape.save_to, "vars");
        assert!(!scrape.multiple);
        assert_eq!(scrape.save_as.as_deref(), Some("login_hidden"));
    }

    #[test]
    fn test_assert_defaults_to_all_fail_fast() {
        let step: Step =
            serde_json::from_str(r#"{"id":"a","type":"assert","conditions":[{"expr":"1"}]}"#)
                .unwrap();
        let StepKind::Assert(assert) = step.kind else {
            panic!("expected assert step");
        };
        assert_eq!(assert.mode, AssertMode::All);
        assert!(assert.fail_fast);
        assert!(assert.message.is_none());
    }

    #[test]
    fn test_unknown_step_type_is_rejected() {
        let result: Result<Step, _> = serde_json::from_str(r#"{"id":"x","type":"browser"}"#);
        assert!(result.is_err());
    }
}
