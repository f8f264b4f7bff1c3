//! Submission gate.
//!
//! A binary signal with capacity 1. Acquisition never blocks: a caller that
//! finds the gate taken gets `None` and is expected to drop its request.

use parking_lot::{Mutex, MutexGuard};

/// Non-blocking mutual exclusion for frame submission.
#[derive(Debug, Default)]
pub struct SubmissionGate {
    slot: Mutex<()>,
}

/// Proof that the gate is held. Releases it on drop, on every exit path.
#[derive(Debug)]
pub struct GatePermit<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-timeout probe.
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        self.slot.try_lock().map(|guard| GatePermit { _guard: guard })
    }

    /// True while a permit is outstanding.
    pub fn is_held(&self) -> bool {
        self.slot.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_probe_fails_while_held() {
        let gate = SubmissionGate::new();
        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.try_acquire().is_none());
        assert!(gate.is_held());
    }

    #[test]
    fn drop_releases() {
        let gate = SubmissionGate::new();
        drop(gate.try_acquire());
        assert!(!gate.is_held());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn other_thread_is_turned_away() {
        let gate = Arc::new(SubmissionGate::new());
        let _permit = gate.try_acquire().unwrap();

        let contender = Arc::clone(&gate);
        let acquired = std::thread::spawn(move || contender.try_acquire().is_some())
            .join()
            .unwrap();
        assert!(!acquired);
    }
}
