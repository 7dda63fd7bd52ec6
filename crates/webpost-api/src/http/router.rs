//! Axum router configuration with middleware.
//!
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        // Runs
        .route("/scenarios/{id}/runs", post(handlers::run::create_run))
        .route("/runs/{id}", get(handlers::run::get_run))
        .route("/runs/{id}/logs", get(handlers::run::get_run_logs))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
