//! Decision engine: primary provider with deterministic fallback.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::contracts::{Extracted, NextAction, TurnRequest};

use super::completion::CompletionClient;
use super::fallback;

/// Which implementation produced the action. Reported to callers and logged
/// so provider degradation is visible without ever surfacing as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionProvider {
    Primary,
    Fallback,
}

impl DecisionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionProvider::Primary => "primary",
            DecisionProvider::Fallback => "fallback",
        }
    }
}

/// Outcome of one `decide` call.
#[derive(Debug, Clone)]
pub struct Decision {
    pub next_action: NextAction,
    pub provider: DecisionProvider,
    pub extracted: Extracted,
}

/// Deterministic idempotency key for a side-effecting tool call: stable for
/// a given `(call_id, turn_id, tool_name)` so retried decisions produce the
/// same key and the downstream tool executor can deduplicate.
pub fn idempotency_key(call_id: &str, turn_id: &str, tool_name: &str) -> String {
    let digest = Sha256::digest(format!("{call_id}:{turn_id}:{tool_name}").as_bytes());
    hex::encode(digest)[..32].to_string()
}

/// The turn-decision engine. Holds the optional completion client; without
/// one, every decision takes the fallback path.
pub struct DecisionEngine {
    completion: Option<CompletionClient>,
}

impl DecisionEngine {
    pub fn new(completion: Option<CompletionClient>) -> Self {
        Self { completion }
    }

    /// Produces exactly one next action for the turn.
    ///
    /// The primary provider gets a single attempt; validation failure,
    /// transport failure, or a missing credential all take the same fallback
    /// path, keeping per-turn latency bounded under provider degradation.
    pub async fn decide(&self, request: &TurnRequest) -> Decision {
        let extracted = fallback::extract(request);

        if let Some(client) = &self.completion {
            match client.next_action(request).await {
                Ok(action) => {
                    let action = normalize(action, request);
                    debug!(
                        call_id = %request.call_id,
                        turn_id = %request.turn_id,
                        action = action.kind(),
                        "primary decision accepted"
                    );
                    return Decision {
                        next_action: action,
                        provider: DecisionProvider::Primary,
                        extracted,
                    };
                }
                Err(e) => {
                    warn!(
                        call_id = %request.call_id,
                        turn_id = %request.turn_id,
                        error = %e,
                        "completion provider degraded, taking fallback path"
                    );
                }
            }
        }

        Decision {
            next_action: fallback::decide(request),
            provider: DecisionProvider::Fallback,
            extracted,
        }
    }
}

/// Enforces the tool-call idempotency invariant on a provider-produced
/// action: a missing key is filled in deterministically, a provider-supplied
/// key is replaced by the deterministic one so retried turns agree.
fn normalize(action: NextAction, request: &TurnRequest) -> NextAction {
    match action {
        NextAction::ToolCall {
            tool_name,
            tool_args,
            ..
        } => {
            let key = idempotency_key(&request.call_id, &request.turn_id, &tool_name);
            NextAction::ToolCall {
                tool_name,
                tool_args,
                idempotency_key: Some(key),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{CallerInput, TurnContext};

    fn request(text: &str) -> TurnRequest {
        TurnRequest {
            trace_id: None,
            tenant_id: "tenant_abc".to_string(),
            call_id: "call-1".to_string(),
            turn_id: "turn-1".to_string(),
            caller_input: CallerInput {
                kind: "speech".to_string(),
                text: text.to_string(),
            },
            context: TurnContext::default(),
        }
    }

    #[test]
    fn test_idempotency_key_deterministic() {
        let a = idempotency_key("call-1", "turn-1", "create_lead");
        let b = idempotency_key("call-1", "turn-1", "create_lead");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_idempotency_key_varies_with_inputs() {
        let base = idempotency_key("call-1", "turn-1", "create_lead");
        assert_ne!(base, idempotency_key("call-2", "turn-1", "create_lead"));
        assert_ne!(base, idempotency_key("call-1", "turn-2", "create_lead"));
        assert_ne!(base, idempotency_key("call-1", "turn-1", "send_sms"));
    }

    #[tokio::test]
    async fn test_no_client_takes_fallback() {
        let engine = DecisionEngine::new(None);
        let decision = engine.decide(&request("I want to speak to a human")).await;
        assert_eq!(decision.provider, DecisionProvider::Fallback);
        assert_eq!(
            decision.next_action,
            NextAction::Handoff {
                reason: "caller_requested_human".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_decide_is_idempotent_for_same_turn() {
        let engine = DecisionEngine::new(None);
        let req = request("please book me an appointment");
        let first = engine.decide(&req).await;
        let second = engine.decide(&req).await;
        assert_eq!(first.next_action, second.next_action);
        match (&first.next_action, &second.next_action) {
            (
                NextAction::ToolCall {
                    idempotency_key: a, ..
                },
                NextAction::ToolCall {
                    idempotency_key: b, ..
                },
            ) => {
                assert!(a.is_some());
                assert_eq!(a, b);
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_fills_missing_key() {
        let req = request("anything");
        let action = NextAction::ToolCall {
            tool_name: "create_lead".to_string(),
            tool_args: serde_json::json!({}),
            idempotency_key: None,
        };
        match normalize(action, &req) {
            NextAction::ToolCall {
                idempotency_key, ..
            } => assert_eq!(
                idempotency_key.as_deref(),
                Some(super::idempotency_key("call-1", "turn-1", "create_lead").as_str())
            ),
            other => panic!("expected tool_call, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_overrides_provider_key() {
        let req = request("anything");
        let action = NextAction::ToolCall {
            tool_name: "create_lead".to_string(),
            tool_args: serde_json::json!({}),
            idempotency_key: Some("model-invented".to_string()),
        };
        match normalize(action, &req) {
            NextAction::ToolCall {
                idempotency_key, ..
            } => assert_ne!(idempotency_key.as_deref(), Some("model-invented")),
            other => panic!("expected tool_call, got {other:?}"),
        }
    }
}
