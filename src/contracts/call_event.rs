//! Inbound call-event envelope parsing.
//!
//! Telephony providers deliver call events either form-encoded (Twilio-style
//! `CallSid`/`To`/`From` keys) or as JSON, with the interesting fields at the
//! top level or nested under `data.payload`. This module extracts the three
//! fields the ingress pipeline needs and reports unparsable bodies and
//! missing fields as distinct failures.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Structured event emitted once per authenticated, routed inbound webhook.
///
/// Immutable after construction; handed to the orchestrator layer and logged,
/// never persisted by this core.
#[derive(Debug, Clone, Serialize)]
pub struct InboundCallEvent {
    pub trace_id: String,
    pub call_id: String,
    pub tenant_id: String,
    pub provider_call_id: String,
    pub from_number: String,
    pub to_number: String,
}

impl InboundCallEvent {
    pub fn new(
        tenant_id: String,
        provider_call_id: String,
        from_number: String,
        to_number: String,
    ) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            call_id: Uuid::new_v4().to_string(),
            tenant_id,
            provider_call_id,
            from_number,
            to_number,
        }
    }
}

/// Why an envelope could not be extracted from the request body.
///
/// `Unparsable` maps to a payload error (400); `MissingField` means the body
/// parsed fine but a required field was absent (422).
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("unparsable envelope: {0}")]
    Unparsable(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// The provider-independent view of one inbound call event.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnvelope {
    pub provider_call_id: String,
    pub from: String,
    pub to: String,
}

impl CallEnvelope {
    /// Parses a raw webhook body according to its content type.
    ///
    /// Anything that is not JSON is treated as form-encoded, matching how
    /// telephony providers default to `application/x-www-form-urlencoded`.
    pub fn parse(content_type: Option<&str>, raw: &[u8]) -> Result<Self, EnvelopeError> {
        let is_json = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim() == "application/json")
            .unwrap_or(false);

        if is_json {
            Self::from_json(raw)
        } else {
            Self::from_form(raw)
        }
    }

    /// Parses a Twilio-style form-encoded body (`CallSid`, `To`, `From`).
    pub fn from_form(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)
            .map_err(|e| EnvelopeError::Unparsable(e.to_string()))?;

        let field = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            provider_call_id: field("CallSid").ok_or(EnvelopeError::MissingField("CallSid"))?,
            to: field("To").ok_or(EnvelopeError::MissingField("To"))?,
            from: field("From").ok_or(EnvelopeError::MissingField("From"))?,
        })
    }

    /// Parses a JSON body, accepting fields at the top level or nested under
    /// `data.payload` (Telnyx-style event envelopes).
    pub fn from_json(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| EnvelopeError::Unparsable(e.to_string()))?;

        // Prefer the nested payload when present; fall back to the root.
        let payload = value
            .pointer("/data/payload")
            .filter(|p| p.is_object())
            .unwrap_or(&value);

        let field = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| payload.get(*n))
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            provider_call_id: field(&["call_control_id", "call_sid", "call_id"])
                .ok_or(EnvelopeError::MissingField("call_id"))?,
            to: field(&["to"]).ok_or(EnvelopeError::MissingField("to"))?,
            from: field(&["from"]).ok_or(EnvelopeError::MissingField("from"))?,
        })
    }
}
