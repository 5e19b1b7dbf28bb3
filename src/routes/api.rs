use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, decide, speak};
use crate::state::AppState;
use std::sync::Arc;

/// Create the service API router: turn decisioning, speech synthesis, and
/// utterance cancellation, plus the health endpoint.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(api::health_check))
        .route("/v1/turns/decide", post(decide::decide_handler))
        .route("/v1/speech/synthesize", post(speak::synthesize_handler))
        .route(
            "/v1/utterances/{utterance_id}/stop",
            post(speak::stop_utterance_handler),
        )
        .layer(TraceLayer::new_for_http())
}
