//! Turn decisioning.
//!
//! `DecisionEngine::decide` converts one turn request into exactly one next
//! action. The primary path asks an external completion provider; any
//! failure along that path (missing credential, transport error, non-2xx,
//! output that does not validate) lands on the deterministic local fallback.
//! There is no partial-success state and no retry within a single call.

pub mod completion;
pub mod engine;
pub mod fallback;

pub use completion::CompletionClient;
pub use engine::{Decision, DecisionEngine, DecisionProvider, idempotency_key};
