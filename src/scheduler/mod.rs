//! Dual-deadline scan scheduler
//!
//! One thread of control serves two periodic obligations: sampling free
//! memory (short period) and scanning the arena (long period). Each
//! iteration sleeps until the nearer deadline, then evaluates the memory
//! check before the data check. An exposure period ends on any reallocation
//! or checkpoint; the outer loop then starts a fresh one.

mod shutdown;

pub use shutdown::ShutdownSignal;

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::arena::BitArena;
use crate::config::DetectorConfig;
use crate::ledger::{CheckpointOutcome, Statistics, StatisticsLedger};
use crate::probe::{Clock, MemoryProbe, SystemClock, SystemMemoryProbe};
use crate::sizing::{desired_bits, SizingDecision, SizingPolicy};
use crate::util::maybe_flip_bit;
use crate::DetectorError;

/// How an exposure period ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodOutcome {
    /// Arena was reallocated
    Resized {
        /// Length before, in bits
        from_bits: u64,
        /// Length after, in bits
        to_bits: u64,
        /// Whether the period was checkpointed before reallocating
        checkpointed: bool,
        /// Set bit found by that checkpoint, if any
        upset: Option<usize>,
    },
    /// Scheduled scan ran and statistics were persisted
    Checkpointed {
        /// Index of the set bit, if one was found
        upset: Option<usize>,
    },
    /// Shutdown was requested; nothing was persisted
    Interrupted,
}

/// Owns the arena and drives sizing, scanning, and accounting
#[derive(Debug)]
pub struct ScanScheduler<P: MemoryProbe, C: Clock> {
    config: DetectorConfig,
    policy: SizingPolicy,
    arena: BitArena,
    force_reinit: bool,
    ledger: StatisticsLedger,
    probe: P,
    clock: C,
    shutdown: ShutdownSignal,
    rng: StdRng,
}

impl ScanScheduler<SystemMemoryProbe, SystemClock> {
    /// Scheduler wired to the real host, loading statistics from the configured path
    pub fn with_host(config: DetectorConfig, shutdown: ShutdownSignal) -> Result<Self, DetectorError> {
        let ledger = StatisticsLedger::load(&config.statistics_path)?;
        Self::new(config, ledger, SystemMemoryProbe::new(), SystemClock, shutdown)
    }
}

impl<P: MemoryProbe, C: Clock> ScanScheduler<P, C> {
    /// Create scheduler with an empty arena
    pub fn new(
        config: DetectorConfig,
        ledger: StatisticsLedger,
        probe: P,
        clock: C,
        shutdown: ShutdownSignal,
    ) -> Result<Self, DetectorError> {
        config.validate()?;
        Ok(Self {
            policy: SizingPolicy::new(config.relative_change_threshold),
            config,
            arena: BitArena::new(),
            force_reinit: false,
            ledger,
            probe,
            clock,
            shutdown,
            rng: StdRng::from_entropy(),
        })
    }

    /// Allocate the arena, then run exposure periods until shutdown
    pub fn run(&mut self) -> Result<(), DetectorError> {
        self.initial_allocation()?;
        loop {
            if self.run_period()? == PeriodOutcome::Interrupted {
                return Ok(());
            }
        }
    }

    /// Size the arena from the current free memory, bypassing the policy
    pub fn initial_allocation(&mut self) -> Result<u64, DetectorError> {
        let bits = self.desired_bits();
        self.arena.allocate(bits)?;
        Ok(bits)
    }

    /// Run one exposure period
    pub fn run_period(&mut self) -> Result<PeriodOutcome, DetectorError> {
        let memory_period = self.config.memory_check_period;
        let data_period = self.config.data_check_period;

        let start = self.clock.now();
        let mut last_memory_check = start;
        let mut last_data_check = start;

        loop {
            let now = self.clock.now();
            let sleep_for = remaining(memory_period, now, last_memory_check)
                .min(remaining(data_period, now, last_data_check));
            self.clock.sleep(sleep_for);

            if self.shutdown.is_raised() {
                info!("shutdown requested, ending exposure period");
                return Ok(PeriodOutcome::Interrupted);
            }

            if self.clock.now().saturating_duration_since(last_memory_check) >= memory_period {
                let current = self.arena.len_bits();
                let desired = self.desired_bits();
                match self.policy.decide(&mut self.force_reinit, current, desired) {
                    SizingDecision::NoUpdate => {
                        debug!("update no need");
                        last_memory_check = self.clock.now();
                    }
                    SizingDecision::UpdateNoCheck => {
                        self.arena.allocate(desired)?;
                        return Ok(PeriodOutcome::Resized {
                            from_bits: current,
                            to_bits: desired,
                            checkpointed: false,
                            upset: None,
                        });
                    }
                    SizingDecision::UpdateWithCheck => {
                        let outcome = self.checkpoint(start)?;
                        self.arena.allocate(desired)?;
                        return Ok(PeriodOutcome::Resized {
                            from_bits: current,
                            to_bits: desired,
                            checkpointed: true,
                            upset: outcome.upset,
                        });
                    }
                }
            }

            if self.clock.now().saturating_duration_since(last_data_check) >= data_period {
                let outcome = self.checkpoint(start)?;
                return Ok(PeriodOutcome::Checkpointed {
                    upset: outcome.upset,
                });
            }
        }
    }

    /// Scan the arena and fold the period started at `period_start` into the ledger
    fn checkpoint(&mut self, period_start: Instant) -> Result<CheckpointOutcome, DetectorError> {
        if let Some(probability) = self.config.simulate_upset_probability {
            maybe_flip_bit(&mut self.arena, probability, &mut self.rng);
        }

        let elapsed = self
            .clock
            .now()
            .saturating_duration_since(period_start)
            .as_secs_f64();
        let upset = self.arena.scan();
        let outcome = self.ledger.checkpoint(elapsed, self.arena.len_bits(), upset)?;
        if outcome.force_reinit {
            self.force_reinit = true;
        }

        let stats = self.ledger.statistics();
        info!(
            elapsed_seconds = elapsed,
            gbit_hours = stats.gbit_hours,
            seu_cases = stats.seu_cases,
            run_hours = stats.run_hours,
            "checkpoint"
        );
        Ok(outcome)
    }

    fn desired_bits(&mut self) -> u64 {
        desired_bits(
            self.probe.free_bytes(),
            self.arena.len_bits(),
            self.config.usage_rate,
        )
    }

    /// Whether the next sizing evaluation will reinitialise the arena
    pub fn force_reinit(&self) -> bool {
        self.force_reinit
    }

    /// Monitored arena
    pub fn arena(&self) -> &BitArena {
        &self.arena
    }

    /// Mutable access to the arena, for fault injection
    pub fn arena_mut(&mut self) -> &mut BitArena {
        &mut self.arena
    }

    /// Accumulated statistics
    pub fn statistics(&self) -> &Statistics {
        self.ledger.statistics()
    }

    /// Sizing policy in use
    pub fn policy(&self) -> &SizingPolicy {
        &self.policy
    }

    /// Memory probe in use
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Clock in use
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Shared shutdown flag
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }
}

fn remaining(period: Duration, now: Instant, last: Instant) -> Duration {
    period.saturating_sub(now.saturating_duration_since(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_saturates() {
        let base = Instant::now();
        let later = base + Duration::from_secs(3);
        assert_eq!(remaining(Duration::from_secs(1), later, base), Duration::ZERO);
        assert_eq!(
            remaining(Duration::from_secs(10), later, base),
            Duration::from_secs(7)
        );
    }
}
