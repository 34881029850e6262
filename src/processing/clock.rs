//! Clock sources consulted by the timestamp reconciler

use crate::core::ClockTime;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// The pipeline clock supplied by the host
pub trait PipelineClock: Send + Sync {
    fn time(&self) -> ClockTime;
}

/// Wall-clock time since the Unix epoch
pub trait WallClock: Send + Sync {
    fn now(&self) -> ClockTime;
}

/// Wall clock backed by the system real-time clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> ClockTime {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| ClockTime::from_nseconds(d.as_nanos() as u64))
            .unwrap_or(ClockTime::ZERO)
    }
}

/// Monotonic pipeline clock counting from its creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    base: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { base: Instant::now() }
    }

    pub fn with_base(base: Instant) -> Self {
        Self { base }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineClock for MonotonicClock {
    fn time(&self) -> ClockTime {
        ClockTime::from_nseconds(self.base.elapsed().as_nanos() as u64)
    }
}

/// Externally driven clock, usable as either clock kind
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: ClockTime) -> Self {
        Self {
            now: AtomicU64::new(now.nseconds()),
        }
    }

    pub fn set(&self, now: ClockTime) {
        self.now.store(now.nseconds(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: ClockTime) {
        self.now.fetch_add(by.nseconds(), Ordering::SeqCst);
    }

    pub fn get(&self) -> ClockTime {
        ClockTime::from_nseconds(self.now.load(Ordering::SeqCst))
    }
}

impl PipelineClock for ManualClock {
    fn time(&self) -> ClockTime {
        self.get()
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> ClockTime {
        self.get()
    }
}
