use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::core::decision::{CompletionClient, DecisionEngine};
use crate::core::routing::RoutingTable;
use crate::core::signature::SignatureVerifier;
use crate::core::tts::{SpeechService, UtteranceCancellations};

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Webhook signature verifier, configured once at startup
    pub verifier: SignatureVerifier,
    /// Tenant routing cache (mtime-refreshed, read-mostly)
    pub routing: Arc<RoutingTable>,
    /// Turn-decision engine (primary provider + deterministic fallback)
    pub decision: Arc<DecisionEngine>,
    /// Speech streaming service with barge-in cancellation
    pub speech: Arc<SpeechService>,
    /// Utterance cancellation set shared between stop requests and streams
    pub cancellations: Arc<UtteranceCancellations>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let verifier =
            SignatureVerifier::new(config.signature_scheme(), config.signature_tolerance());

        let routing = Arc::new(match &config.tenant_routing_path {
            Some(path) => RoutingTable::from_file(path.clone()),
            None => RoutingTable::unconfigured(),
        });

        let completion = config.completion_api_key.as_ref().map(|key| {
            CompletionClient::new(
                config.completion_api_url.clone(),
                key.clone(),
                config.completion_model.clone(),
                Duration::from_secs(config.completion_timeout_seconds),
            )
        });
        let decision = Arc::new(DecisionEngine::new(completion));

        let cancellations = Arc::new(UtteranceCancellations::new());
        let speech = Arc::new(SpeechService::new(&config, cancellations.clone()));

        Arc::new(Self {
            config,
            verifier,
            routing,
            decision,
            speech,
            cancellations,
        })
    }

    /// State with injected collaborators, for tests that need a fixed
    /// routing table or a mock provider endpoint.
    pub fn with_parts(
        config: ServerConfig,
        routing: Arc<RoutingTable>,
        decision: Arc<DecisionEngine>,
    ) -> Arc<Self> {
        let verifier =
            SignatureVerifier::new(config.signature_scheme(), config.signature_tolerance());
        let cancellations = Arc::new(UtteranceCancellations::new());
        let speech = Arc::new(SpeechService::new(&config, cancellations.clone()));

        Arc::new(Self {
            config,
            verifier,
            routing,
            decision,
            speech,
            cancellations,
        })
    }
}
