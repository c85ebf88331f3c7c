//! Cooperative shutdown flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flag raised by an interrupt handler and polled after every sleep
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    raised: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create an unraised signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown was requested
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let signal = ShutdownSignal::new();
        let handle = signal.clone();
        assert!(!signal.is_raised());
        handle.raise();
        assert!(signal.is_raised());
    }
}
