//! Wake-reason flag and sleep outcomes.
//!
//! The flag is the only state shared between the scheduler and interrupt
//! handlers. Handlers raise it with an application-defined nonzero cause
//! code; the scheduler reads it after every halt and clears it before
//! returning so a stale value never ends the next sleep immediately.

use core::fmt;

use portable_atomic::{AtomicU8, Ordering};

/// Flag value meaning no asynchronous wake is pending.
pub const NO_WAKE_PENDING: u8 = 0;

/// Shared byte written by interrupt handlers to request a wake.
///
/// Intended to live in a `static` so handlers can reach it. The scheduler
/// is the only reader and the only writer of zero; handlers only ever
/// store nonzero cause codes.
#[derive(Debug)]
pub struct WakeFlag {
    cause: AtomicU8,
}

impl WakeFlag {
    /// Creates a flag with no wake pending.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cause: AtomicU8::new(NO_WAKE_PENDING),
        }
    }

    /// Records a wake request. Called from interrupt context.
    ///
    /// A zero `cause` is ignored; zero is reserved for "nothing pending".
    pub fn raise(&self, cause: u8) {
        if cause != NO_WAKE_PENDING {
            self.cause.store(cause, Ordering::Release);
        }
    }

    /// Reads the pending cause without clearing it.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.cause.load(Ordering::Acquire)
    }

    /// Resets the flag to "no wake pending".
    pub fn clear(&self) {
        self.cause.store(NO_WAKE_PENDING, Ordering::Release);
    }
}

impl Default for WakeFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a sleep request returned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WakeCause {
    /// The requested duration elapsed in full.
    Timer,
    /// The periodic tick callback returned this nonzero code.
    Tick(u8),
    /// An interrupt handler raised the wake flag with this nonzero code.
    Interrupt(u8),
}

impl fmt::Display for WakeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WakeCause::Timer => write!(f, "timer"),
            WakeCause::Tick(code) => write!(f, "tick {code}"),
            WakeCause::Interrupt(code) => write!(f, "interrupt {code}"),
        }
    }
}

/// The transport never became ready within the allowed wait, so no
/// power-down was attempted. Recoverable; the caller may retry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SleepNotPossible;

impl fmt::Display for SleepNotPossible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sleep not possible: transport not ready")
    }
}

/// Outcome of one call to [`request`](crate::scheduler::SleepController::request).
pub type SleepResult = Result<WakeCause, SleepNotPossible>;
