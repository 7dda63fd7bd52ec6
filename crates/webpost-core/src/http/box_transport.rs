//! BoxHttpTransport -- object-safe dynamic dispatch wrapper for HttpTransport.
//!
//! 1. Define an object-safe `HttpTransportDyn` trait with boxed futures
//! 2. Blanket-impl `HttpTransportDyn` for all `T: HttpTransport`
//! 3. `BoxHttpTransport` wraps `Box<dyn HttpTransportDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use super::transport::{CookieRecord, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Object-safe version of [`HttpTransport`] with boxed futures.
pub trait HttpTransportDyn: Send + Sync {
    fn name(&self) -> &str;

    fn request_boxed<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

    fn snapshot_cookies(&self) -> Vec<CookieRecord>;
}

impl<T: HttpTransport> HttpTransportDyn for T {
    fn name(&self) -> &str {
        HttpTransport::name(self)
    }

    fn request_boxed<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>> {
        Box::pin(self.request(request))
    }

    fn snapshot_cookies(&self) -> Vec<CookieRecord> {
        HttpTransport::snapshot_cookies(self)
    }
}

/// Type-erased transport so the handler registry can hold any session
/// implementation (reqwest in production, scripted stubs in tests).
pub struct BoxHttpTransport {
    inner: Box<dyn HttpTransportDyn + Send + Sync>,
}

impl BoxHttpTransport {
    pub fn new<T: HttpTransport + 'static>(transport: T) -> Self {
        Self {
            inner: Box::new(transport),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.inner.request_boxed(request).await
    }

    pub fn snapshot_cookies(&self) -> Vec<CookieRecord> {
        self.inner.snapshot_cookies()
    }
}

impl std::fmt::Debug for BoxHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxHttpTransport")
            .field("name", &self.name())
            .finish()
    }
}
