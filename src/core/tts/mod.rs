//! Speech synthesis: provider-backed streaming with barge-in cancellation
//! and a deterministic placeholder fallback.

pub mod cancel;
pub mod elevenlabs;
pub mod service;

pub use cancel::UtteranceCancellations;
pub use service::{FALLBACK_CHUNK, ProviderUsed, SpeechService};
