//! Cooperative cancellation for load sessions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag for cancelling an in-flight load.
///
/// Clones share the same underlying state: the controller keeps one
/// handle and moves another into the ingestion thread, which polls it
/// between buffer reads. Cancellation is a request, not a preemption —
/// the ingestion loop stops at its next check.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Non-blocking; observable from every clone.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_not_cancelled() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_from_clones() {
        let token = CancelToken::new();
        let other = token.clone();

        other.cancel();

        assert!(token.is_cancelled());
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_cancel_crosses_threads() {
        let token = CancelToken::new();
        let moved = token.clone();

        let handle = thread::spawn(move || {
            moved.cancel();
        });
        handle.join().unwrap();

        assert!(token.is_cancelled());
    }
}
