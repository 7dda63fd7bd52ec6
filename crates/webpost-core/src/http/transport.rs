//! HttpTransport trait definition and the request/response shapes it moves.
//!
//! A transport owns one HTTP session: cookies set by a response are sent on
//! subsequent requests made through the same transport instance.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Fully rendered request ready to send.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Form-encoded body pairs. Empty means no body.
    pub form: Vec<(String, String)>,
    /// `Some(false)` disables redirect following; `None` uses the
    /// transport default (follow).
    pub allow_redirects: Option<bool>,
}

impl HttpRequest {
    /// Whether redirects should be followed for this request.
    pub fn follows_redirects(&self) -> bool {
        self.allow_redirects.unwrap_or(true)
    }
}

/// One hop in a followed redirect chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectHop {
    pub status: u16,
    pub url: String,
    pub location: Option<String>,
    /// Whether the hop response carried a `Set-Cookie` header.
    pub set_cookie: bool,
}

/// Raw response as received from the wire.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// Header names are lower-case. Repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// Intermediate redirect responses, oldest first.
    pub history: Vec<RedirectHop>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A cookie held by the transport session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Session-scoped HTTP client.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
/// Implementations live in webpost-infra (`ReqwestTransport`).
pub trait HttpTransport: Send + Sync {
    /// Human-readable transport name, used in logs.
    fn name(&self) -> &str;

    /// Send one request and read the whole body.
    fn request(
        &self,
        request: &HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, TransportError>> + Send;

    /// Current cookie jar contents.
    fn snapshot_cookies(&self) -> Vec<CookieRecord>;
}
