//! Monotonic millisecond clock shared with a free-running timer interrupt.
//!
//! While the CPU is halted the timer interrupt does not run, so the counter
//! falls behind by exactly the time spent asleep. The scheduler repays that
//! debt after every increment that completed without interruption by
//! calling [`MonotonicClock::advance`].

use portable_atomic::{AtomicU32, Ordering};

/// Read and correction access to the node's millisecond counter.
///
/// `advance` must be atomic with respect to the timer interrupt that also
/// updates the counter; the correction touches every byte of the value.
pub trait MonotonicClock {
    /// Current counter value in milliseconds. Wraps after ~49 days.
    fn now(&self) -> u32;

    /// Adds `elapsed_ms` to the counter in a single atomic update.
    fn advance(&self, elapsed_ms: u32);
}

/// Free-running millisecond counter backed by an atomic word.
///
/// The timer interrupt calls [`bump`](MillisCounter::bump) once per
/// millisecond while the CPU runs; the scheduler calls `advance` to account
/// for halted time. On cores without native 32-bit atomics the
/// `portable-atomic` critical-section fallback makes both updates
/// uninterruptible.
#[derive(Debug)]
pub struct MillisCounter {
    millis: AtomicU32,
}

impl MillisCounter {
    /// Creates a counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            millis: AtomicU32::new(0),
        }
    }

    /// Advances the counter by one millisecond. Called from the timer ISR.
    pub fn bump(&self) {
        self.millis.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for MillisCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for MillisCounter {
    fn now(&self) -> u32 {
        self.millis.load(Ordering::Acquire)
    }

    fn advance(&self, elapsed_ms: u32) {
        self.millis.fetch_add(elapsed_ms, Ordering::AcqRel);
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now(&self) -> u32 {
        (**self).now()
    }

    fn advance(&self, elapsed_ms: u32) {
        (**self).advance(elapsed_ms);
    }
}
