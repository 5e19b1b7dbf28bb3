//! Deterministic fallback decisioning.
//!
//! A total, pure substitute for the completion provider: every non-empty
//! caller text maps to a valid next action, and the same input always maps
//! to the same action. Keyword groups are checked in priority order; the
//! first hit wins.
//!
//! Only the latest utterance is inspected. Urgency established in earlier
//! turns does not carry over; that is a known product-policy gap (see
//! DESIGN.md), not something this layer compensates for.

use serde_json::json;

use crate::contracts::{Extracted, NextAction, TurnRequest};

use super::engine::idempotency_key;

/// Phrases that mean the caller wants a person. Highest priority.
const HANDOFF_PHRASES: [&str; 7] = [
    "speak to a human",
    "talk to a human",
    "real person",
    "speak to someone",
    "talk to someone",
    "representative",
    "operator",
];

/// Phrases that mean the caller is done.
const END_CALL_PHRASES: [&str; 6] = [
    "goodbye",
    "bye bye",
    "hang up",
    "that's all",
    "that is all",
    "end the call",
];

/// Phrases that signal scheduling/booking intent worth capturing as a lead.
const SCHEDULING_PHRASES: [&str; 8] = [
    "appointment",
    "schedule",
    "book",
    "booking",
    "quote",
    "estimate",
    "callback",
    "call me back",
];

/// Urgency markers used for best-effort extraction only.
const URGENCY_PHRASES: [&str; 5] = ["emergency", "urgent", "asap", "right away", "right now"];

/// The tool the fallback invokes for scheduling intents.
pub const LEAD_TOOL: &str = "create_lead";

/// Reason string reported when the caller asked for a person.
pub const REASON_CALLER_REQUESTED_HUMAN: &str = "caller_requested_human";

/// Reason string reported when the caller ended the conversation.
pub const REASON_CALLER_ENDED_CALL: &str = "caller_ended_call";

/// Decides the next action from the latest caller text alone.
pub fn decide(request: &TurnRequest) -> NextAction {
    let text = request.caller_input.text.to_lowercase();

    if contains_any(&text, &HANDOFF_PHRASES) {
        return NextAction::Handoff {
            reason: REASON_CALLER_REQUESTED_HUMAN.to_string(),
        };
    }

    if contains_any(&text, &END_CALL_PHRASES) {
        return NextAction::EndCall {
            reason: REASON_CALLER_ENDED_CALL.to_string(),
        };
    }

    if contains_any(&text, &SCHEDULING_PHRASES) {
        return NextAction::ToolCall {
            tool_name: LEAD_TOOL.to_string(),
            tool_args: json!({
                "tenant_id": request.tenant_id,
                "caller_number": request.context.from_number,
                "summary": request.caller_input.text,
            }),
            idempotency_key: Some(idempotency_key(
                &request.call_id,
                &request.turn_id,
                LEAD_TOOL,
            )),
        };
    }

    NextAction::Speak {
        text: clarifying_prompt(request),
    }
}

/// Best-effort intent/urgency extraction from the same keyword signals.
pub fn extract(request: &TurnRequest) -> Extracted {
    let text = request.caller_input.text.to_lowercase();

    let intent = if contains_any(&text, &HANDOFF_PHRASES) {
        Some("human_escalation".to_string())
    } else if contains_any(&text, &END_CALL_PHRASES) {
        Some("end_call".to_string())
    } else if contains_any(&text, &SCHEDULING_PHRASES) {
        Some("scheduling".to_string())
    } else {
        None
    };

    let urgency = contains_any(&text, &URGENCY_PHRASES).then(|| "high".to_string());

    let entities = request
        .context
        .from_number
        .iter()
        .map(|n| format!("caller_number:{n}"))
        .collect();

    Extracted {
        intent,
        urgency,
        entities,
    }
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

fn clarifying_prompt(request: &TurnRequest) -> String {
    match &request.context.business_profile {
        Some(profile) => format!(
            "Thanks for calling {}. Could you tell me a bit more about what you need help with?",
            profile.name
        ),
        None => {
            "I'm sorry, I didn't quite catch that. Could you tell me a bit more about what you need help with?"
                .to_string()
        }
    }
}
