//! Liveness endpoints (no envelope).

use axum::Json;
use serde_json::{Value, json};

/// GET /health and GET / - Simple health check.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "webpost",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_ok() {
        let Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "webpost");
    }
}
