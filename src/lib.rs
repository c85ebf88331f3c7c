//! # Single-Event-Upset Detector
//!
//! Watches physical RAM for bit flips caused by cosmic radiation or other
//! transient faults. A large buffer of zero bits is allocated, sized to a
//! fraction of the memory the host reports as free, and periodically scanned
//! for any bit that has become one.
//!
//! ## Core Loop
//!
//! 1. **Sizing**: every memory period the free memory is sampled and the
//!    arena is reallocated when the desired size moved far enough
//! 2. **Scanning**: every data period the arena is searched for a set bit
//! 3. **Accounting**: each exposure period folds `bits * seconds` into the
//!    persisted statistics, giving an observed upset rate per Gbit-hour
//!
//! ## Usage Example
//!
//! ```ignore
//! use seu_detector::{DetectorConfig, ScanScheduler, ShutdownSignal};
//!
//! let config = DetectorConfig::default();
//! let mut scheduler = ScanScheduler::with_host(config, ShutdownSignal::new())?;
//! scheduler.run()?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod arena;      // Zero-initialised bit buffer
pub mod config;     // Tunables and validation
pub mod ledger;     // Exposure statistics and persistence
pub mod probe;      // Host memory and clock seams
pub mod scheduler;  // Dual-deadline control loop
pub mod sizing;     // Resize decision policy
pub mod util;       // Timing instrumentation and fault simulation

// Re-exports for convenience
pub use arena::{ArenaError, BitArena};
pub use config::DetectorConfig;
pub use ledger::{CheckpointOutcome, LedgerError, Statistics, StatisticsLedger};
pub use probe::{Clock, MemoryProbe, SystemClock, SystemMemoryProbe};
pub use scheduler::{PeriodOutcome, ScanScheduler, ShutdownSignal};
pub use sizing::{desired_bits, SizingDecision, SizingPolicy};

use thiserror::Error;

/// Errors surfaced by the detector core
#[derive(Error, Debug)]
pub enum DetectorError {
    /// Configuration value out of range
    #[error("Invalid detector configuration: {0}")]
    InvalidConfiguration(String),

    /// Arena could not be (re)allocated
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Statistics could not be loaded or persisted
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_error_converts() {
        let err: DetectorError = ArenaError::Allocation { bits: 64 }.into();
        assert!(matches!(err, DetectorError::Arena(_)));
        assert!(err.to_string().contains("64"));
    }
}
