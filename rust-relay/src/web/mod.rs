//! Web server module for receiving GitHub webhooks.
//!
//! Routes:
//! - `POST /webhook`: signed push deliveries
//! - `GET /health`: liveness check
//!
//! Everything else answers with a JSON 404, and other methods on `/webhook`
//! with a JSON 405.

pub mod handlers;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    github_webhook, health, method_not_allowed, not_found, AppState, ErrorResponse,
    StatusResponse,
};
pub use signature::{verify_github_signature, SignatureError, SIGNATURE_HEADER};

/// Largest webhook body GitHub delivers (25 MB); axum's default is 2 MB.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/webhook",
            post(github_webhook)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES)),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
