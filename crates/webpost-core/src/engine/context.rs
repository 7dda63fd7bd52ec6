//! Per-run mutable state.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use super::template::RenderSources;

/// Most recent HTTP response as seen by templates under `last.*`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastResponse {
    pub status: u16,
    pub url: String,
    /// Decoded body text.
    pub text: String,
    pub headers: BTreeMap<String, String>,
}

impl LastResponse {
    /// Value of one top-level `last.*` field. Unknown names render as "".
    pub fn field(&self, name: &str) -> Value {
        match name {
            "status" => json!(self.status),
            "url" => Value::String(self.url.clone()),
            "text" => Value::String(self.text.clone()),
            "headers" => json!(self.headers),
            _ => Value::String(String::new()),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "status": self.status,
            "url": self.url,
            "text": self.text,
            "headers": self.headers,
        })
    }
}

/// State threaded through every step of one run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Assigned by the executor when empty.
    pub run_id: String,
    /// Caller inputs plus scraped values.
    pub vars: Map<String, Value>,
    /// Scratch space for scrape steps with `save_to: state`.
    pub state: Map<String, Value>,
    pub last: Option<LastResponse>,
    /// Accumulated run output.
    pub result: Map<String, Value>,
}

impl RunContext {
    pub fn new(vars: Map<String, Value>) -> Self {
        Self {
            vars,
            ..Default::default()
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Status of the last HTTP response, if any HTTP step ran.
    pub fn last_status(&self) -> Option<u16> {
        self.last.as_ref().map(|last| last.status)
    }

    /// Borrow the template roots. `secrets` is passed in because it is
    /// resolved per call from the secret provider, never stored on the run.
    pub fn render_sources<'a>(&'a self, secrets: &'a Map<String, Value>) -> RenderSources<'a> {
        RenderSources {
            vars: &self.vars,
            state: &self.state,
            secrets,
            last: self.last.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_field_lookup() {
        let last = LastResponse {
            status: 302,
            url: "https://example.test/done".to_string(),
            text: "<html/>".to_string(),
            headers: BTreeMap::from([("location".to_string(), "/next".to_string())]),
        };
        assert_eq!(last.field("status"), json!(302));
        assert_eq!(last.field("headers")["location"], "/next");
        assert_eq!(last.field("cookies"), json!(""));
        assert_eq!(last.to_value()["url"], "https://example.test/done");
    }

    #[test]
    fn test_last_status_none_before_http() {
        let ctx = RunContext::new(Map::new()).with_run_id("r1");
        assert_eq!(ctx.run_id, "r1");
        assert_eq!(ctx.last_status(), None);
    }
}
