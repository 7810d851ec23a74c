// src/scheduler/time_interface.rs - Clock seam for the control loop
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic time and of the pause between ticks.
pub trait TimeInterface: Send + Sync {
    fn now_monotonic(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Standard time sync abstraction using std::time.
#[derive(Debug, Default)]
pub struct StdTimeSync;

impl TimeInterface for StdTimeSync {
    fn now_monotonic(&self) -> Instant {
        Instant::now()
    }

    /// Sleeps the current thread for the specified duration.
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Virtual clock that only moves when told to.
///
/// `sleep` advances the clock instead of blocking, so a loop paced by it runs
/// as fast as possible with exact, repeatable timestamps.
#[derive(Debug)]
pub struct ManualTime {
    origin: Instant,
    offset_nanos: AtomicU64,
}

impl ManualTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Time elapsed on this clock since it was created.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeInterface for ManualTime {
    fn now_monotonic(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration)
    }
}
