//! Structured observability events.
//!
//! Thin wrappers over `tracing` with stable event names and field sets so
//! downstream log pipelines can key on them. Fire-and-forget: nothing here
//! is on the correctness path, and caller utterance text never appears in
//! degradation or error events.

use tracing::{info, warn};

use crate::contracts::InboundCallEvent;
use crate::core::decision::DecisionProvider;
use crate::core::tts::ProviderUsed;

/// Emitted once per authenticated, routed inbound call.
pub fn inbound_call_accepted(event: &InboundCallEvent) {
    info!(
        event = "inbound_call_accepted",
        trace_id = %event.trace_id,
        call_id = %event.call_id,
        tenant_id = %event.tenant_id,
        provider_call_id = %event.provider_call_id,
        from_number = %event.from_number,
        to_number = %event.to_number,
        "inbound call accepted"
    );
}

/// Emitted once per turn decision, distinguishing primary from fallback.
pub fn decision_made(trace_id: &str, call_id: &str, provider: DecisionProvider, action: &str) {
    info!(
        event = "decision_made",
        trace_id = %trace_id,
        call_id = %call_id,
        provider = provider.as_str(),
        action = action,
        "turn decision made"
    );
}

/// Emitted whenever an external provider degrades and a fallback takes over.
/// The diagnostic is provider-facing; it never contains caller content.
pub fn provider_degraded(provider: &str, diagnostic: &str) {
    warn!(
        event = "provider_degraded",
        provider = provider,
        diagnostic = diagnostic,
        "external provider degraded, fallback engaged"
    );
}

pub fn synthesis_started(utterance_id: &str, provider: ProviderUsed) {
    info!(
        event = "synthesis_started",
        utterance_id = %utterance_id,
        provider = provider.as_str(),
        "synthesis stream started"
    );
}

pub fn synthesis_cancelled(utterance_id: &str, chunks_forwarded: usize) {
    info!(
        event = "synthesis_cancelled",
        utterance_id = %utterance_id,
        chunks_forwarded = chunks_forwarded,
        "synthesis stream cancelled at chunk boundary"
    );
}

pub fn synthesis_finished(utterance_id: &str, chunks_forwarded: usize, bytes_forwarded: usize) {
    info!(
        event = "synthesis_finished",
        utterance_id = %utterance_id,
        chunks_forwarded = chunks_forwarded,
        bytes_forwarded = bytes_forwarded,
        "synthesis stream finished"
    );
}
