//! Base-URL joining for relative step URLs.

use webpost_core::engine::deps::UrlResolver;

/// Joins relative URLs onto a scenario's `defaults.http.base_url`.
///
/// Absolute `http://`/`https://` URLs pass through. Otherwise exactly one
/// slash separates base and path. This is plain concatenation, not RFC 3986
/// reference resolution: `..` segments and query-only references are kept
/// verbatim.
#[derive(Debug, Clone)]
pub struct BaseUrlResolver {
    base_url: String,
}

impl BaseUrlResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl UrlResolver for BaseUrlResolver {
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}
