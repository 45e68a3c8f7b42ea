//! Webhook endpoint handlers.
//!
//! The webhook handler:
//! 1. Verifies the HMAC signature over the raw body
//! 2. Parses the push event and relays main-branch pushes
//! 3. Acknowledges the delivery whatever happened downstream

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::dispatch::{relay_push, Dispatcher, PushEvent};
use crate::web::signature::{verify_github_signature, SignatureError, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Status body, e.g. `{"status": "received"}`.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Error body, e.g. `{"error": "Invalid method"}`.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for SignatureError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check endpoint.
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// GitHub push webhook endpoint.
///
/// Downstream failures are logged by the relay and never change the
/// response, so GitHub does not redeliver because a target is down.
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusResponse>, SignatureError> {
    let event_name = header_str(&headers, "X-GitHub-Event").unwrap_or("unknown");
    let delivery = header_str(&headers, "X-GitHub-Delivery").unwrap_or("unknown");

    info!(
        event = %event_name,
        delivery = %delivery,
        body_length = body.len(),
        "github_webhook_received"
    );

    verify_github_signature(
        &state.config.webhook_secret,
        headers.get(SIGNATURE_HEADER).map(|v| v.as_bytes()),
        &body,
    )?;

    match PushEvent::from_slice(&body) {
        Ok(event) => {
            relay_push(&state.dispatcher, &state.config.targets, &event).await;
        }
        Err(e) => {
            warn!(delivery = %delivery, error = %e, "github_webhook_invalid_json");
        }
    }

    info!(delivery = %delivery, "github_webhook_acknowledged");

    Ok(Json(StatusResponse { status: "received" }))
}

/// Non-POST requests to the webhook route.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Invalid method".to_string(),
        }),
    )
}

/// Any route that is not defined.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "This route is not defined. Please use a valid route!".to_string(),
        }),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
