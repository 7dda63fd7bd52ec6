//! Lightweight page-identification signals extracted from HTML responses.
//!
//! Non-browser clients cannot run JavaScript, so intermediate pages that
//! auto-submit a form or refresh via `<meta>` are flagged explicitly.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::json;

use crate::engine::html;
use crate::logging::Logger;

use super::{HttpTrace, TraceEnricher};

static AUTO_SUBMIT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)document\.forms?\[0\]\.submit\(\)").ok());

static META_REFRESH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta[^>]+http-equiv=["']refresh"#).ok());

/// Hidden inputs worth logging. Never add credential fields here.
pub const DEFAULT_HIDDEN_WHITELIST: [&str; 5] = [
    "screenID",
    "referrer",
    "state",
    "csrfToken",
    "__RequestVerificationToken",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HtmlSignals {
    pub title: String,
    pub form_action: Option<String>,
    pub auto_submit: bool,
    pub meta_refresh: bool,
    #[serde(rename = "screenID")]
    pub screen_id: Option<String>,
    pub hidden_summary: BTreeMap<String, Option<String>>,
}

impl HtmlSignals {
    pub fn extract(text: &str, title: Option<&str>, whitelist: &[String]) -> Self {
        let doc = html::parse(text);
        Self {
            title: title.unwrap_or_default().to_string(),
            form_action: html::first_form_action(&doc),
            auto_submit: is_match(&AUTO_SUBMIT, text),
            meta_refresh: is_match(&META_REFRESH, text),
            screen_id: html::hidden_value(&doc, "screenID"),
            hidden_summary: whitelist
                .iter()
                .map(|name| (name.clone(), html::hidden_value(&doc, name)))
                .collect(),
        }
    }
}

fn is_match(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Logs `http.html_signals`.
#[derive(Debug, Clone)]
pub struct HtmlSignalLogger {
    whitelist: Vec<String>,
}

impl HtmlSignalLogger {
    pub fn with_whitelist(whitelist: Vec<String>) -> Self {
        Self { whitelist }
    }
}

impl Default for HtmlSignalLogger {
    fn default() -> Self {
        Self::with_whitelist(DEFAULT_HIDDEN_WHITELIST.iter().map(|s| s.to_string()).collect())
    }
}

impl TraceEnricher for HtmlSignalLogger {
    fn name(&self) -> &'static str {
        "html_signals"
    }

    fn enrich(&self, trace: &HttpTrace<'_>, logger: &dyn Logger) {
        let signals = HtmlSignals::extract(trace.text, trace.html_title.as_deref(), &self.whitelist);
        let mut fields = json!({"step_id": trace.step_id});
        if let (Some(map), Ok(serde_json::Value::Object(extra))) =
            (fields.as_object_mut(), serde_json::to_value(&signals))
        {
            map.extend(extra);
        }
        logger.info("http.html_signals", fields);
    }
}
