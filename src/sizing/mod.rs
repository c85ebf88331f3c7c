//! Resize policy for the monitored arena
//!
//! Reallocation zero-fills the whole buffer, so small fluctuations in free
//! memory are ignored. Empty/non-empty transitions and detected upsets are
//! acted on immediately.

use tracing::debug;

/// Outcome of a sizing evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingDecision {
    /// Leave the arena as it is
    NoUpdate,
    /// Reallocate without folding the current period into statistics
    UpdateNoCheck,
    /// Checkpoint the current period at the old size, then reallocate
    UpdateWithCheck,
}

/// Decides whether the arena must be resized
#[derive(Debug, Clone, Copy)]
pub struct SizingPolicy {
    relative_change_threshold: f64,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl SizingPolicy {
    /// Create policy reallocating once `|desired - current| / min` exceeds the threshold
    pub fn new(relative_change_threshold: f64) -> Self {
        Self {
            relative_change_threshold,
        }
    }

    /// Threshold in use
    pub fn relative_change_threshold(&self) -> f64 {
        self.relative_change_threshold
    }

    /// Evaluate the rules in order. A raised `force_reinit` is consumed.
    pub fn decide(
        &self,
        force_reinit: &mut bool,
        current_bits: u64,
        desired_bits: u64,
    ) -> SizingDecision {
        if *force_reinit {
            debug!("force_reinit");
            *force_reinit = false;
            return SizingDecision::UpdateNoCheck;
        }

        match (current_bits, desired_bits) {
            (0, 0) => return SizingDecision::NoUpdate,
            (0, _) | (_, 0) => return SizingDecision::UpdateNoCheck,
            _ => {}
        }

        let delta = desired_bits as f64 - current_bits as f64;
        let rel = delta.abs() / current_bits.min(desired_bits) as f64;
        if rel > self.relative_change_threshold {
            debug!(delta, rel, "relative size change above threshold");
            if delta > 0.0 {
                SizingDecision::UpdateWithCheck
            } else {
                SizingDecision::UpdateNoCheck
            }
        } else {
            SizingDecision::NoUpdate
        }
    }
}

/// Number of bits the arena should hold given the host's free memory.
///
/// The arena's own bytes count as available, otherwise a freshly allocated
/// arena would always look like a reason to shrink.
pub fn desired_bits(free_bytes: u64, current_bits: u64, usage_rate: f64) -> u64 {
    let used = current_bits / 8;
    let total = free_bytes.saturating_add(used);
    let to_use = (total as f64 * usage_rate) as u64;
    debug!(free = free_bytes, used, total, to_use, "memory to use");
    to_use.saturating_mul(8)
}
