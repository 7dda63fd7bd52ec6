//! HTTP exchange tracing.
//!
//! The HTTP handler builds one [`HttpTrace`] per request and hands it to a
//! [`TraceEmitter`], which runs every registered [`TraceEnricher`] in order.
//! Enrichers only log; they never affect the step outcome.

pub mod cookie_diff;
pub mod exchange;
pub mod html_signals;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::http::transport::{CookieRecord, RedirectHop};
use crate::logging::Logger;

/// Response metadata captured for tracing.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Charset actually used to decode the body.
    pub encoding: Option<String>,
    pub content_type: Option<String>,
    pub history: Vec<RedirectHop>,
    /// Length of the decoded body in characters.
    pub body_len: usize,
    /// Lower-case hex SHA-256 of the raw body bytes.
    pub body_sha256: String,
}

impl ResponseMeta {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Everything known about one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpTrace<'a> {
    pub run_id: &'a str,
    pub step_id: &'a str,
    pub method: &'a str,
    pub url: &'a str,
    pub allow_redirects: Option<bool>,
    pub request_headers: &'a BTreeMap<String, String>,
    /// Final (deduplicated) form pairs as sent.
    pub request_form: &'a [(String, String)],
    pub merged_from: Option<&'a str>,
    pub merged_count: usize,
    pub collision_keys: Vec<String>,
    pub cookies_before: Vec<CookieRecord>,
    pub cookies_after: Vec<CookieRecord>,
    pub response: ResponseMeta,
    /// Decoded body.
    pub text: &'a str,
    pub raw: &'a [u8],
    pub html_title: Option<String>,
}

impl HttpTrace<'_> {
    /// First `max_chars` characters of the decoded body.
    pub fn text_head(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => self.text,
        }
    }
}

/// One trace consumer.
pub trait TraceEnricher: Send + Sync {
    fn name(&self) -> &'static str;

    fn enrich(&self, trace: &HttpTrace<'_>, logger: &dyn Logger);
}

/// Ordered list of enrichers run for every HTTP exchange.
#[derive(Clone, Default)]
pub struct TraceEmitter {
    enrichers: Vec<Arc<dyn TraceEnricher>>,
}

impl TraceEmitter {
    pub fn new(enrichers: Vec<Arc<dyn TraceEnricher>>) -> Self {
        Self { enrichers }
    }

    /// Core, cookie diff and HTML signal enrichers, followed by `extra`.
    pub fn standard(extra: Vec<Arc<dyn TraceEnricher>>) -> Self {
        let mut enrichers: Vec<Arc<dyn TraceEnricher>> = vec![
            Arc::new(exchange::CoreTraceLogger),
            Arc::new(cookie_diff::CookieDiffLogger),
            Arc::new(html_signals::HtmlSignalLogger::default()),
        ];
        enrichers.extend(extra);
        Self { enrichers }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.enrichers.iter().map(|e| e.name()).collect()
    }

    pub fn emit(&self, trace: &HttpTrace<'_>, logger: &dyn Logger) {
        for enricher in &self.enrichers {
            enricher.enrich(trace, logger);
        }
    }
}

impl std::fmt::Debug for TraceEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceEmitter")
            .field("enrichers", &self.names())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub static EMPTY_HEADERS: BTreeMap<String, String> = BTreeMap::new();

    pub fn response_meta(status: u16, headers: BTreeMap<String, String>) -> ResponseMeta {
        ResponseMeta {
            status,
            url: "https://example.test/after".to_string(),
            headers,
            encoding: Some("utf-8".to_string()),
            content_type: Some("text/html".to_string()),
            history: Vec::new(),
            body_len: 0,
            body_sha256: "00".to_string(),
        }
    }

    pub fn make_trace<'a>(text: &'a str, form: &'a [(String, String)]) -> HttpTrace<'a> {
        HttpTrace {
            run_id: "run-1",
            step_id: "login",
            method: "POST",
            url: "https://example.test/login",
            allow_redirects: Some(false),
            request_headers: &EMPTY_HEADERS,
            request_form: form,
            merged_from: None,
            merged_count: 0,
            collision_keys: Vec::new(),
            cookies_before: Vec::new(),
            cookies_after: Vec::new(),
            response: response_meta(200, BTreeMap::new()),
            text,
            raw: text.as_bytes(),
            html_title: None,
        }
    }
}
