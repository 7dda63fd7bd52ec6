//! HTTP transport abstractions.
//!
//! - `HttpTransport`: RPITIT trait for concrete session-aware clients
//! - `BoxHttpTransport`: object-safe wrapper for dynamic dispatch

pub mod box_transport;
pub mod transport;
