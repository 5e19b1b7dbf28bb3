//! Speech-synthesis and utterance-stop handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use crate::contracts::SynthesisRequest;
use crate::errors::AppError;
use crate::state::AppState;

/// Response header naming the utterance the stream belongs to.
pub const UTTERANCE_ID_HEADER: &str = "x-utterance-id";
/// Response header naming the provider that actually produced the stream.
pub const TTS_PROVIDER_HEADER: &str = "x-tts-provider";

/// Handler for the speech-synthesis endpoint.
///
/// Validates the request (422 with field detail on violation) and responds
/// with a chunked audio body. The provider header is accurate: the service
/// resolves primary-vs-fallback before the response head is written.
pub async fn synthesize_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SynthesisRequest>,
) -> Result<Response, AppError> {
    let errors = request.validate();
    if !errors.is_empty() {
        return Err(AppError::ValidationFailure(errors));
    }

    let utterance_id = request.utterance_id.clone();
    let content_type = content_type_for(&request.audio.format);

    let (provider, rx) = state.speech.synthesize(request).await;

    let stream = ReceiverStream::new(rx).map(Ok::<Bytes, Infallible>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(HeaderName::from_static(UTTERANCE_ID_HEADER), utterance_id)
        .header(
            HeaderName::from_static(TTS_PROVIDER_HEADER),
            provider.as_str(),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Handler for the utterance-stop endpoint.
///
/// Always `202`: marking an utterance with no stream in flight is a
/// harmless no-op, and a repeated stop for the same utterance is idempotent.
pub async fn stop_utterance_handler(
    State(state): State<Arc<AppState>>,
    Path(utterance_id): Path<String>,
) -> impl IntoResponse {
    state.speech.stop(&utterance_id);

    (
        StatusCode::ACCEPTED,
        Json(json!({ "ok": true, "utterance_id": utterance_id })),
    )
}

/// Content type for the requested encoding.
fn content_type_for(format: &str) -> &'static str {
    match format {
        "mp3" => "audio/mpeg",
        "ulaw" => "audio/basic",
        "linear16" | "pcm" => "audio/pcm",
        _ => "application/octet-stream",
    }
}
