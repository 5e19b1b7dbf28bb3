//! Speech streaming service.
//!
//! Turns a synthesis request into a chunked audio byte stream. The primary
//! path streams from ElevenLabs; a missing credential, an unsupported
//! provider name, or a provider failure before the first byte all degrade to
//! a single deterministic placeholder chunk so the caller always receives
//! something to play or discard.
//!
//! Streaming is cooperatively cancellable: before every chunk is forwarded
//! the cancellation set is consulted, and a marked utterance stops at that
//! chunk boundary without error. Audio already written is not retracted, and
//! the in-flight provider request is not aborted server-side; only
//! forwarding stops.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::contracts::SynthesisRequest;
use crate::core::events;

use super::cancel::UtteranceCancellations;
use super::elevenlabs;

/// Marker bytes emitted when no real synthesis happened. Deliberately not
/// audio: orchestrators detect the marker and discard or substitute.
pub const FALLBACK_CHUNK: &[u8] = b"FRONTDESK-TTS-FALLBACK\n";

/// Which synthesis implementation actually produced the stream. Surfaced to
/// the caller in the `x-tts-provider` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderUsed {
    ElevenLabs,
    Fallback,
}

impl ProviderUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderUsed::ElevenLabs => "elevenlabs",
            ProviderUsed::Fallback => "fallback",
        }
    }
}

/// Bound on buffered chunks between the provider reader and the HTTP
/// response writer.
const CHANNEL_CAPACITY: usize = 32;

pub struct SpeechService {
    api_key: Option<String>,
    default_voice_id: String,
    model: String,
    client: reqwest::Client,
    cancellations: Arc<UtteranceCancellations>,
}

impl SpeechService {
    pub fn new(config: &ServerConfig, cancellations: Arc<UtteranceCancellations>) -> Self {
        let client = reqwest::Client::builder()
            // Connect timeout only: a total request timeout would cut long
            // utterance streams short.
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: config.elevenlabs_api_key.clone(),
            default_voice_id: config.elevenlabs_voice_id.clone(),
            model: config.elevenlabs_model.clone(),
            client,
            cancellations,
        }
    }

    /// Marks an utterance for cancellation. Asynchronous with respect to the
    /// stream and idempotent.
    pub fn stop(&self, utterance_id: &str) {
        self.cancellations.mark(utterance_id);
        debug!(utterance_id = %utterance_id, "utterance marked for cancellation");
    }

    /// Starts synthesis and returns the provider actually used plus the
    /// chunk receiver. The provider decision is final once this returns, so
    /// response headers can be written before the first chunk arrives.
    pub async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> (ProviderUsed, mpsc::Receiver<Bytes>) {
        let utterance_id = request.utterance_id.clone();

        if request.provider != "elevenlabs" {
            warn!(
                utterance_id = %utterance_id,
                provider = %request.provider,
                "unsupported synthesis provider, serving fallback chunk"
            );
            return (ProviderUsed::Fallback, self.fallback_stream(&utterance_id));
        }

        let Some(api_key) = self.api_key.clone() else {
            debug!(
                utterance_id = %utterance_id,
                "no synthesis credential configured, serving fallback chunk"
            );
            return (ProviderUsed::Fallback, self.fallback_stream(&utterance_id));
        };

        let http_request = elevenlabs::build_http_request(
            &self.client,
            &api_key,
            &self.model,
            &self.default_voice_id,
            &request,
        );

        // Await the response head here so the caller learns which provider
        // is actually streaming before it commits to response headers.
        let response = match http_request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                events::provider_degraded("elevenlabs", &format!("status {status}: {body}"));
                return (ProviderUsed::Fallback, self.fallback_stream(&utterance_id));
            }
            Err(e) => {
                events::provider_degraded("elevenlabs", &e.to_string());
                return (ProviderUsed::Fallback, self.fallback_stream(&utterance_id));
            }
        };

        events::synthesis_started(&utterance_id, ProviderUsed::ElevenLabs);

        let (tx, rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);
        let cancellations = self.cancellations.clone();
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut chunks_forwarded = 0usize;
            let mut bytes_forwarded = 0usize;

            while let Some(item) = stream.next().await {
                // Check-before-write: a stop issued before this point is
                // observed here and terminates at this chunk boundary.
                if cancellations.observed(&utterance_id) {
                    events::synthesis_cancelled(&utterance_id, chunks_forwarded);
                    return;
                }

                match item {
                    Ok(chunk) => {
                        bytes_forwarded += chunk.len();
                        chunks_forwarded += 1;
                        if tx.send(chunk).await.is_err() {
                            // Receiver dropped: the caller went away.
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            utterance_id = %utterance_id,
                            error = %e,
                            "synthesis stream read failed mid-utterance"
                        );
                        if chunks_forwarded == 0 {
                            // Nothing delivered yet: the caller still gets
                            // the placeholder rather than silence.
                            let _ = tx.send(Bytes::from_static(FALLBACK_CHUNK)).await;
                        }
                        break;
                    }
                }
            }

            cancellations.clear(&utterance_id);
            events::synthesis_finished(&utterance_id, chunks_forwarded, bytes_forwarded);
        });

        (ProviderUsed::ElevenLabs, rx)
    }

    /// Produces the single-chunk placeholder stream. The cancellation
    /// discipline applies here too: a pre-marked utterance gets zero chunks.
    fn fallback_stream(&self, utterance_id: &str) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel::<Bytes>(1);

        if self.cancellations.observed(utterance_id) {
            events::synthesis_cancelled(utterance_id, 0);
        } else {
            // Capacity 1 and a fresh channel: this send cannot fail.
            let _ = tx.try_send(Bytes::from_static(FALLBACK_CHUNK));
            events::synthesis_finished(utterance_id, 1, FALLBACK_CHUNK.len());
        }
        self.cancellations.clear(utterance_id);

        rx
    }
}
