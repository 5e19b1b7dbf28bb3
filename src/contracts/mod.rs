//! Shared request/response contracts for the telephony core.
//!
//! These types define the wire shapes of the three service surfaces (call
//! ingress, turn decisioning, speech synthesis) together with their
//! validators. They carry no behavior beyond parsing and validation; the
//! services in `crate::core` consume them.

pub mod call_event;
pub mod synthesis;
pub mod turn;

pub use call_event::{CallEnvelope, EnvelopeError, InboundCallEvent};
pub use synthesis::{AudioParams, SynthesisRequest, VoiceParams};
pub use turn::{
    BusinessProfile, CallerInput, DecideResponse, Extracted, FaqItem, NextAction, TurnContext,
    TurnRequest,
};
