//! Deterministic host fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use seu_detector::{Clock, MemoryProbe};

/// Virtual clock: `sleep` advances time instantly and is recorded
#[derive(Debug)]
pub struct FakeClock {
    base: Instant,
    offset: Duration,
    pub sleeps: Vec<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Duration::ZERO,
            sleeps: Vec::new(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.offset
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + self.offset
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.offset += duration;
    }
}

/// Replays scripted free-memory readings, repeating the last one forever
#[derive(Debug)]
pub struct ScriptedProbe {
    readings: VecDeque<u64>,
    last: u64,
    pub calls: usize,
}

impl ScriptedProbe {
    pub fn new(readings: impl IntoIterator<Item = u64>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: 0,
            calls: 0,
        }
    }

    /// Host with `free` bytes before allocation; afterwards the arena holds
    /// `usage_rate` of it and the remainder is reported free.
    pub fn steady_host(free: u64, usage_rate: f64) -> Self {
        let held = (free as f64 * usage_rate) as u64;
        Self::new([free, free - held])
    }
}

impl MemoryProbe for ScriptedProbe {
    fn free_bytes(&mut self) -> u64 {
        self.calls += 1;
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last
    }
}
