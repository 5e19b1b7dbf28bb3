//! Turn-decision contracts: the per-turn request supplied by the
//! orchestrator, the closed set of next actions, and the response shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::FieldError;

/// Caller input types the decision engine understands.
pub const CALLER_INPUT_TYPES: [&str; 3] = ["speech", "text", "dtmf"];

/// One caller-utterance / agent-response exchange. The core holds no history
/// across turns; everything the decision needs arrives in this request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Correlation ID; generated server-side when absent
    #[serde(default)]
    pub trace_id: Option<String>,
    pub tenant_id: String,
    pub call_id: String,
    pub turn_id: String,
    pub caller_input: CallerInput,
    #[serde(default)]
    pub context: TurnContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerInput {
    /// "speech" | "text" | "dtmf"
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnContext {
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub to_number: Option<String>,
    #[serde(default)]
    pub business_profile: Option<BusinessProfile>,
    #[serde(default)]
    pub faq_items: Vec<FaqItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqItem {
    pub q: String,
    pub a: String,
}

/// The one action the agent takes next. Exactly one variant per turn; every
/// consumption point pattern-matches the closed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NextAction {
    Speak {
        text: String,
    },
    ToolCall {
        tool_name: String,
        #[serde(default)]
        tool_args: Value,
        /// Deterministic for a given (call_id, turn_id, tool_name); filled in
        /// by the engine when the primary provider omits it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        idempotency_key: Option<String>,
    },
    Handoff {
        reason: String,
    },
    EndCall {
        reason: String,
    },
}

impl NextAction {
    /// Short tag for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            NextAction::Speak { .. } => "speak",
            NextAction::ToolCall { .. } => "tool_call",
            NextAction::Handoff { .. } => "handoff",
            NextAction::EndCall { .. } => "end_call",
        }
    }
}

/// Best-effort intent/urgency/entity extraction; any or all fields may be
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extracted {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
}

/// Response of the turn-decision endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideResponse {
    pub trace_id: String,
    pub tenant_id: String,
    pub call_id: String,
    pub turn_id: String,
    pub next_action: NextAction,
    pub extracted: Extracted,
}

impl TurnRequest {
    /// Field-level schema validation; an empty result means the request is
    /// acceptable for decisioning.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.tenant_id.trim().is_empty() {
            errors.push(FieldError::new("tenant_id", "must not be empty"));
        }
        if self.call_id.trim().is_empty() {
            errors.push(FieldError::new("call_id", "must not be empty"));
        }
        if self.turn_id.trim().is_empty() {
            errors.push(FieldError::new("turn_id", "must not be empty"));
        }
        if !CALLER_INPUT_TYPES.contains(&self.caller_input.kind.as_str()) {
            errors.push(FieldError::new(
                "caller_input.type",
                format!("must be one of: {}", CALLER_INPUT_TYPES.join(", ")),
            ));
        }
        if self.caller_input.text.trim().is_empty() {
            errors.push(FieldError::new("caller_input.text", "must not be empty"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> TurnRequest {
        TurnRequest {
            trace_id: None,
            tenant_id: "tenant_abc".to_string(),
            call_id: "call-1".to_string(),
            turn_id: "turn-1".to_string(),
            caller_input: CallerInput {
                kind: "speech".to_string(),
                text: "do you have availability tomorrow".to_string(),
            },
            context: TurnContext::default(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_empty());
    }

    #[test]
    fn test_empty_text_rejected() {
        let mut req = valid_request();
        req.caller_input.text = "   ".to_string();
        let errors = req.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "caller_input.text");
    }

    #[test]
    fn test_unknown_input_type_rejected() {
        let mut req = valid_request();
        req.caller_input.kind = "telepathy".to_string();
        let errors = req.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "caller_input.type");
    }

    #[test]
    fn test_multiple_failures_reported_together() {
        let mut req = valid_request();
        req.tenant_id = String::new();
        req.turn_id = String::new();
        assert_eq!(req.validate().len(), 2);
    }

    #[test]
    fn test_next_action_tagged_serialization() {
        let action = NextAction::Handoff {
            reason: "caller_requested_human".to_string(),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({"type": "handoff", "reason": "caller_requested_human"})
        );
    }

    #[test]
    fn test_next_action_round_trips_tool_call() {
        let raw = json!({
            "type": "tool_call",
            "tool_name": "create_lead",
            "tool_args": {"name": "Ada"},
            "idempotency_key": "abc123"
        });
        let action: NextAction = serde_json::from_value(raw).unwrap();
        match &action {
            NextAction::ToolCall {
                tool_name,
                idempotency_key,
                ..
            } => {
                assert_eq!(tool_name, "create_lead");
                assert_eq!(idempotency_key.as_deref(), Some("abc123"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_action_tag_rejected() {
        let raw = json!({"type": "transfer", "target": "+15550001111"});
        assert!(serde_json::from_value::<NextAction>(raw).is_err());
    }

    #[test]
    fn test_turn_request_minimal_json() {
        let raw = json!({
            "tenant_id": "tenant_abc",
            "call_id": "c1",
            "turn_id": "t1",
            "caller_input": {"type": "speech", "text": "hello"}
        });
        let req: TurnRequest = serde_json::from_value(raw).unwrap();
        assert!(req.trace_id.is_none());
        assert!(req.context.faq_items.is_empty());
        assert!(req.validate().is_empty());
    }
}
