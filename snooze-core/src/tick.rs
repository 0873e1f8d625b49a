//! Optional periodic poll invoked between power-down increments.

/// Application-supplied liveness poll.
///
/// Called at least once per 8 s of sleep, between increments, and one
/// final time when a bounded sleep runs its budget down. Must not perform
/// long-running work or touch hardware that is powered down during sleep;
/// the analog subsystem in particular is unavailable.
pub trait TickHandler {
    /// Returns 0 to keep sleeping, or a nonzero code to end the sleep with
    /// [`WakeCause::Tick`](crate::wake::WakeCause::Tick) carrying it.
    fn poll(&mut self) -> u8;
}

/// Handler used when the application supplies no periodic poll.
///
/// Always continues, which makes "no handler" and "handler that never
/// requests a wake" deliberately indistinguishable to the scheduler.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoTick;

impl NoTick {
    /// Creates the no-op handler.
    pub const fn new() -> Self {
        Self
    }
}

impl TickHandler for NoTick {
    fn poll(&mut self) -> u8 {
        0
    }
}

impl<F: FnMut() -> u8> TickHandler for F {
    fn poll(&mut self) -> u8 {
        self()
    }
}
