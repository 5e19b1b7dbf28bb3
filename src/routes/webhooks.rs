use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::webhook;
use crate::state::AppState;

/// Create the webhook router for telephony provider callbacks.
///
/// These routes are called by the telephony provider and authenticate via
/// signed payloads (see `core::signature`), not session auth.
pub fn create_webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhooks/telephony/call", post(webhook::handle_call_webhook))
        .layer(TraceLayer::new_for_http())
}
