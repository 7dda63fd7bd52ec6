//! Per-run session cookie jar.
//!
//! reqwest's bundled `Jar` cannot be enumerated, and the HTTP traces need
//! the full cookie list before and after every exchange. This jar wraps a
//! [`cookie_store::CookieStore`] (RFC 6265 parsing, expiry, domain and
//! path matching) and implements reqwest's [`CookieStore`] over it.

use std::sync::{PoisonError, RwLock};

use cookie_store::{CookieDomain, RawCookie};
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use webpost_core::http::transport::CookieRecord;

#[derive(Debug, Default)]
pub struct SessionCookieJar {
    store: RwLock<cookie_store::CookieStore>,
}

impl SessionCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie from a raw `Set-Cookie` header value received from `url`.
    pub fn store_set_cookie(&self, header: &str, url: &Url) {
        let Ok(raw) = RawCookie::parse(header.to_string()) else {
            tracing::debug!(url = %url, "ignoring unparsable Set-Cookie");
            return;
        };
        if targets_top_level_domain(&raw, url) {
            tracing::debug!(url = %url, name = raw.name(), "ignoring Set-Cookie for a top-level domain");
            return;
        }
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = store.insert_raw(&raw, url) {
            tracing::debug!(url = %url, name = raw.name(), error = ?e, "Set-Cookie not stored");
        }
    }

    /// Live cookies, grouped by domain and path in first-seen order.
    pub fn snapshot(&self) -> Vec<CookieRecord> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter_unexpired()
            .map(|c| CookieRecord {
                name: c.name().to_string(),
                value: c.value().to_string(),
                domain: match &c.domain {
                    CookieDomain::Suffix(domain) => format!(".{domain}"),
                    other => String::from(other),
                },
                path: String::from(&c.path),
            })
            .collect()
    }

    /// `Cookie` header value for a request to `url`, longest path first.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching = store.matches(url);
        if matching.is_empty() {
            return None;
        }
        // Stable sort keeps store order among equal path lengths.
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Some(
            matching
                .iter()
                .map(|c| format!("{}={}", c.name(), c.value()))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl CookieStore for SessionCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.store_set_cookie(raw, url);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.header_for(url)
            .and_then(|value| HeaderValue::from_str(&value).ok())
    }
}

/// A `Domain` attribute naming a single-label domain other than the
/// request host itself (`Domain=test` sent by `example.test`).
fn targets_top_level_domain(raw: &RawCookie<'_>, url: &Url) -> bool {
    let Some(domain) = raw.domain() else {
        return false;
    };
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    !domain.is_empty() && !domain.contains('.') && domain != host
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_host_only_cookie_round_trip() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("sid=abc; Path=/; HttpOnly", &url("https://shop.example.test/login"));

        assert_eq!(jar.header_for(&url("https://shop.example.test/any")).as_deref(), Some("sid=abc"));
        assert_eq!(jar.header_for(&url("https://other.example.test/")), None);
        assert_eq!(
            jar.snapshot(),
            vec![CookieRecord {
                name: "sid".to_string(),
                value: "abc".to_string(),
                domain: "shop.example.test".to_string(),
                path: "/".to_string(),
            }]
        );
    }

    #[test]
    fn test_domain_cookie_matches_subdomains() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("lang=ja; Domain=.example.test", &url("https://www.example.test/"));

        assert!(jar.header_for(&url("https://api.example.test/")).is_some());
        assert!(jar.header_for(&url("https://example.test/")).is_some());
        assert!(jar.header_for(&url("https://badexample.test/")).is_none());
        assert_eq!(jar.snapshot()[0].domain, ".example.test");
    }

    #[test]
    fn test_foreign_domain_is_rejected() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("x=1; Domain=evil.test", &url("https://example.test/"));
        assert!(jar.snapshot().is_empty());
    }

    #[test]
    fn test_top_level_domain_attribute_is_rejected() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("x=1; Domain=test", &url("https://example.test/"));
        jar.store_set_cookie("y=1; Domain=.test", &url("https://example.test/"));
        assert!(jar.snapshot().is_empty());

        jar.store_set_cookie("z=1; Domain=localhost", &url("http://localhost/"));
        assert_eq!(jar.snapshot().len(), 1);
    }

    #[test]
    fn test_unparsable_header_is_ignored() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("no-equals-sign", &url("https://example.test/"));
        assert!(jar.snapshot().is_empty());
    }

    #[test]
    fn test_default_path_and_path_matching() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("a=1", &url("https://example.test/app/login"));

        assert_eq!(jar.snapshot()[0].path, "/app");
        assert!(jar.header_for(&url("https://example.test/app/home")).is_some());
        assert!(jar.header_for(&url("https://example.test/app")).is_some());
        assert!(jar.header_for(&url("https://example.test/apple")).is_none());
        assert!(jar.header_for(&url("https://example.test/")).is_none());
    }

    #[test]
    fn test_longer_paths_first() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("root=1; Path=/", &url("https://example.test/"));
        jar.store_set_cookie("deep=2; Path=/app", &url("https://example.test/"));
        assert_eq!(
            jar.header_for(&url("https://example.test/app/x")).as_deref(),
            Some("deep=2; root=1")
        );
    }

    #[test]
    fn test_overwrite_and_delete() {
        let jar = SessionCookieJar::new();
        let site = url("https://example.test/");
        jar.store_set_cookie("sid=1; Path=/", &site);
        jar.store_set_cookie("sid=2; Path=/", &site);
        assert_eq!(jar.snapshot().len(), 1);
        assert_eq!(jar.snapshot()[0].value, "2");

        jar.store_set_cookie("sid=; Path=/; Max-Age=0", &site);
        assert!(jar.snapshot().is_empty());

        jar.store_set_cookie("old=1; Path=/; Expires=Wed, 21 Oct 2015 07:28:00 GMT", &site);
        assert!(jar.snapshot().is_empty());
    }

    #[test]
    fn test_secure_cookie_needs_https() {
        let jar = SessionCookieJar::new();
        jar.store_set_cookie("s=1; Secure", &url("https://example.test/"));
        assert!(jar.header_for(&url("http://example.test/")).is_none());
        assert!(jar.header_for(&url("https://example.test/")).is_some());
    }

    #[test]
    fn test_cookie_store_trait() {
        let jar = SessionCookieJar::new();
        let headers = [
            HeaderValue::from_static("a=1; Path=/"),
            HeaderValue::from_static("b=2; Path=/"),
        ];
        jar.set_cookies(&mut headers.iter(), &url("https://example.test/"));
        let value = jar.cookies(&url("https://example.test/")).unwrap();
        assert_eq!(value.to_str().unwrap(), "a=1; b=2");
    }
}
