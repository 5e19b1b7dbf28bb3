//! Turn-decision endpoint handler.

use axum::{extract::State, response::Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::{DecideResponse, TurnRequest};
use crate::core::events;
use crate::errors::AppError;
use crate::state::AppState;

/// Handler for the turn-decision endpoint.
///
/// Validates the request schema (422 with field-level detail on violation),
/// runs the decision engine, and returns the single next action together
/// with best-effort extraction. Provider degradation never surfaces here;
/// the engine resolves it internally and the response only records which
/// path produced the action via the log event.
pub async fn decide_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<DecideResponse>, AppError> {
    let errors = request.validate();
    if !errors.is_empty() {
        return Err(AppError::ValidationFailure(errors));
    }

    let trace_id = request
        .trace_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let decision = state.decision.decide(&request).await;
    events::decision_made(
        &trace_id,
        &request.call_id,
        decision.provider,
        decision.next_action.kind(),
    );

    Ok(Json(DecideResponse {
        trace_id,
        tenant_id: request.tenant_id,
        call_id: request.call_id,
        turn_id: request.turn_id,
        next_action: decision.next_action,
        extracted: decision.extracted,
    }))
}
