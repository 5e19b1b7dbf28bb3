//! Utterance cancellation set.
//!
//! Process-wide set of utterance IDs marked for early termination (barge-in).
//! Stop requests add entries from any task; each in-flight synthesis stream
//! checks the set before forwarding a chunk and consumes its entry when it
//! observes it. An entry outlives at most one in-flight synthesis: whatever
//! the stream does not consume, it clears when it finishes.

use std::collections::HashSet;

use parking_lot::Mutex;

/// Shared cancellation state. Exposes only `mark`/`observed`/`clear` so the
/// locking discipline cannot be bypassed by callers.
#[derive(Debug, Default)]
pub struct UtteranceCancellations {
    inner: Mutex<HashSet<String>>,
}

impl UtteranceCancellations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an utterance for cancellation. Idempotent; marking an ID with
    /// no stream in flight is a harmless no-op that the next stream end (or
    /// nothing at all) cleans up.
    pub fn mark(&self, utterance_id: &str) {
        self.inner.lock().insert(utterance_id.to_string());
    }

    /// Consumes a pending mark. Returns `true` exactly once per mark: the
    /// observing stream removes the entry as it observes it.
    pub fn observed(&self, utterance_id: &str) -> bool {
        self.inner.lock().remove(utterance_id)
    }

    /// Drops any unobserved mark for a finished stream.
    pub fn clear(&self, utterance_id: &str) {
        self.inner.lock().remove(utterance_id);
    }

    /// Whether a mark is currently pending (test and introspection use).
    pub fn is_marked(&self, utterance_id: &str) -> bool {
        self.inner.lock().contains(utterance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_mark_then_observe_consumes() {
        let set = UtteranceCancellations::new();
        set.mark("u1");
        assert!(set.is_marked("u1"));
        assert!(set.observed("u1"));
        // Consumed: a second check sees nothing.
        assert!(!set.observed("u1"));
        assert!(!set.is_marked("u1"));
    }

    #[test]
    fn test_observe_without_mark_is_false() {
        let set = UtteranceCancellations::new();
        assert!(!set.observed("never-marked"));
    }

    #[test]
    fn test_mark_is_idempotent() {
        let set = UtteranceCancellations::new();
        set.mark("u1");
        set.mark("u1");
        assert!(set.observed("u1"));
        assert!(!set.observed("u1"));
    }

    #[test]
    fn test_clear_removes_unobserved_mark() {
        let set = UtteranceCancellations::new();
        set.mark("u1");
        set.clear("u1");
        assert!(!set.observed("u1"));
    }

    #[test]
    fn test_marks_are_per_utterance() {
        let set = UtteranceCancellations::new();
        set.mark("u1");
        assert!(!set.observed("u2"));
        assert!(set.observed("u1"));
    }

    #[tokio::test]
    async fn test_concurrent_markers_and_observer() {
        let set = Arc::new(UtteranceCancellations::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let set = set.clone();
            handles.push(tokio::spawn(async move {
                set.mark(&format!("u{i}"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let observed = (0..16).filter(|i| set.observed(&format!("u{i}"))).count();
        assert_eq!(observed, 16);
    }
}
