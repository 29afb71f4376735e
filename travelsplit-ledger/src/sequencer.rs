use std::sync::atomic::{AtomicU64, Ordering};

/// Simple atomic sequencer used to assign monotonic journal sequences.
#[derive(Debug, Default)]
pub struct LedgerSequencer {
    counter: AtomicU64,
}

impl LedgerSequencer {
    /// Create a new sequencer that starts after the provided value.
    pub fn new(last_sequence: u64) -> Self {
        Self {
            counter: AtomicU64::new(last_sequence),
        }
    }

    /// Return the next monotonic sequence.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last sequence handed out (zero before the first call to `next`).
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Clone for LedgerSequencer {
    fn clone(&self) -> Self {
        Self::new(self.current())
    }
}
