//! reqwest-backed [`HttpTransport`].
//!
//! One `ReqwestTransport` is built per run, so the cookie jar is the run's
//! session. The underlying client never follows redirects on its own: the
//! transport walks the chain itself so that every hop can be recorded
//! (status, `Location`, whether it set a cookie) for the HTTP traces.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode, Url};
use webpost_core::http::transport::{
    CookieRecord, HttpRequest, HttpResponse, HttpTransport, RedirectHop, TransportError,
};
use webpost_types::config::HttpConfig;
use webpost_types::scenario::{DEFAULT_HTTP_TIMEOUT_SECS, Scenario};

use super::cookie_jar::SessionCookieJar;

/// Longest redirect chain followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Client settings for one run.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub user_agent: String,
    pub timeout: Duration,
    /// Sent on every request unless the step sets the same header.
    pub default_headers: BTreeMap<String, String>,
    pub max_redirects: usize,
}

impl TransportOptions {
    /// Scenario defaults, with `[http]` config values taking precedence.
    pub fn for_scenario(scenario: &Scenario, config: &HttpConfig) -> Self {
        let defaults = scenario.defaults.http.as_ref();
        let timeout_sec = config
            .timeout_sec
            .or_else(|| defaults.map(|d| d.timeout_sec))
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        Self {
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(|| scenario.meta.user_agent.clone()),
            timeout: Duration::from_secs(timeout_sec),
            default_headers: defaults.map(|d| d.headers.clone()).unwrap_or_default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Session transport over `reqwest`.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    jar: Arc<SessionCookieJar>,
    default_headers: BTreeMap<String, String>,
    max_redirects: usize,
}

impl ReqwestTransport {
    pub fn new(options: TransportOptions) -> Result<Self, TransportError> {
        let jar = Arc::new(SessionCookieJar::new());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::none())
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            jar,
            default_headers: options.default_headers,
            max_redirects: options.max_redirects,
        })
    }

    pub fn for_scenario(scenario: &Scenario, config: &HttpConfig) -> Result<Self, TransportError> {
        Self::new(TransportOptions::for_scenario(scenario, config))
    }

    fn headers_for(&self, request: &HttpRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.default_headers.iter().chain(request.headers.iter()) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header value for '{name}': {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        form: &[(String, String)],
    ) -> Result<reqwest::Response, TransportError> {
        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .headers(headers.clone());
        if !form.is_empty() {
            builder = builder.form(form);
        }
        builder.send().await.map_err(|e| TransportError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("invalid method: {}", request.method)))?;
        let mut url = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid url '{}': {e}", request.url)))?;
        let headers = self.headers_for(request)?;
        let mut form = request.form.clone();
        let mut history = Vec::new();

        loop {
            let response = self.send(&method, &url, &headers, &form).await?;
            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let location = match location {
                Some(location) if request.follows_redirects() && is_followed(status) => location,
                _ => return read_response(response, history).await,
            };
            if history.len() >= self.max_redirects {
                return Err(TransportError::Request {
                    url: request.url.clone(),
                    reason: format!("too many redirects (limit {})", self.max_redirects),
                });
            }
            let next = url.join(&location).map_err(|e| TransportError::Request {
                url: url.to_string(),
                reason: format!("invalid redirect location '{location}': {e}"),
            })?;

            tracing::trace!(from = %url, to = %next, status = status.as_u16(), "following redirect");
            history.push(RedirectHop {
                status: status.as_u16(),
                url: url.to_string(),
                location: Some(location),
                set_cookie: response.headers().contains_key(SET_COOKIE),
            });

            if matches!(status.as_u16(), 301..=303) && method != Method::HEAD {
                method = Method::GET;
                form.clear();
            }
            url = next;
        }
    }

    fn snapshot_cookies(&self) -> Vec<CookieRecord> {
        self.jar.snapshot()
    }
}

fn is_followed(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

async fn read_response(
    response: reqwest::Response,
    history: Vec<RedirectHop>,
) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let url = response.url().to_string();

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let body = response.bytes().await.map_err(|e| TransportError::Body {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    Ok(HttpResponse {
        status,
        url,
        headers,
        body: body.to_vec(),
        history,
    })
}
