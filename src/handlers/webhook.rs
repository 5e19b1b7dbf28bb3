//! Inbound telephony webhook handler.
//!
//! Runs each request through the ingress state machine
//! `received -> verified -> parsed -> routed -> accepted`, rejecting at the
//! first failed step with a distinct error. Verification comes first: until
//! the signature checks out, nothing from the body is parsed or logged.
//!
//! The endpoint is unauthenticated in the session sense because the
//! telephony provider authenticates via signed payloads; see
//! `core::signature` for the supported schemes.

use axum::{
    extract::{OriginalUri, State},
    http::HeaderMap,
    response::Json,
};
use bytes::Bytes;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::contracts::{CallEnvelope, EnvelopeError, InboundCallEvent};
use crate::core::events;
use crate::errors::{AppError, FieldError};
use crate::state::AppState;
use crate::utils::phone::normalize_e164;

/// Header carrying the provider's signature over the request.
pub const SIGNATURE_HEADER: &str = "x-telephony-signature";
/// Header carrying the provider's signing timestamp (Ed25519 scheme).
pub const TIMESTAMP_HEADER: &str = "x-telephony-timestamp";

/// Handler for inbound call-event webhooks.
///
/// Responds `200 {ok:true}` once the call is verified and routed; the
/// service never blocks on downstream orchestration. Provider retries of the
/// same `provider_call_id` are safe: accepting a call emits a log event and
/// nothing else.
pub async fn handle_call_webhook(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    // Step 1: received -> verified. Fail closed before touching the body.
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);
    let signed_url = state.config.signed_url(uri.path());

    if !state
        .verifier
        .verify(&signed_url, &body, signature, timestamp)
    {
        return Err(AppError::AuthenticationFailure);
    }

    // Step 2: verified -> parsed.
    let content_type = header_str(&headers, "content-type");
    let envelope = CallEnvelope::parse(content_type, &body).map_err(envelope_error)?;

    // Step 3: parsed -> routed.
    let to_number = normalize_e164(&envelope.to).ok_or_else(|| {
        AppError::ValidationFailure(vec![FieldError::new("to", "not a valid phone number")])
    })?;
    let from_number = normalize_e164(&envelope.from).ok_or_else(|| {
        AppError::ValidationFailure(vec![FieldError::new("from", "not a valid phone number")])
    })?;

    let routing = state
        .routing
        .resolve(&to_number)
        .await
        .ok_or(AppError::RoutingMiss)?;

    // Step 4: routed -> accepted.
    let event = InboundCallEvent::new(
        routing.tenant_id,
        envelope.provider_call_id,
        from_number,
        to_number,
    );
    events::inbound_call_accepted(&event);

    Ok(Json(json!({ "ok": true })))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Maps envelope failures onto the error taxonomy: unparsable bodies are
/// payload errors (400), parsed bodies missing a required field are
/// validation failures (422).
fn envelope_error(error: EnvelopeError) -> AppError {
    match error {
        EnvelopeError::Unparsable(diag) => AppError::PayloadError(diag),
        EnvelopeError::MissingField(field) => {
            AppError::ValidationFailure(vec![FieldError::new(field, "required field is missing")])
        }
    }
}
