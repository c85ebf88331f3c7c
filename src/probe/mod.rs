//! Host seams: free memory and time
//!
//! The scheduler only talks to the host through these two traits, so tests
//! can drive it with scripted memory readings and a virtual clock.

use std::fmt::Debug;
use std::thread;
use std::time::{Duration, Instant};

use sysinfo::System;

/// Source of the host's free memory
pub trait MemoryProbe: Debug {
    /// Currently free memory in bytes
    fn free_bytes(&mut self) -> u64;
}

/// Monotonic time source with a blocking sleep
pub trait Clock: Debug {
    /// Current instant
    fn now(&self) -> Instant;

    /// Block for `duration`
    fn sleep(&mut self, duration: Duration);
}

/// Free memory as reported by the operating system
#[derive(Debug)]
pub struct SystemMemoryProbe {
    system: System,
}

impl SystemMemoryProbe {
    /// Create probe
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn free_bytes(&mut self) -> u64 {
        self.system.refresh_memory();
        self.system.free_memory()
    }
}

/// Wall-clock time and real sleeps
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}
