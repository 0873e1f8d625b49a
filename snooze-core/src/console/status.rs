//! Shared status surface for the debug console.
//!
//! The firmware and emulator both answer the `status` command from a
//! [`StatusSnapshot`]; [`StatusFormatter`] keeps the textual rendering
//! consistent across front-ends.

use core::fmt;

use crate::wake::{NO_WAKE_PENDING, SleepNotPossible, WakeCause};

/// Point-in-time node state surfaced by the `status` command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Millisecond counter value, corrections included.
    pub clock_ms: u32,
    /// Whether the transport currently reports ready.
    pub transport_ready: bool,
    /// Raw wake flag value; nonzero means a wake is pending.
    pub pending_wake: u8,
    /// Outcome of the most recent sleep request, if any.
    pub last_sleep: Option<Result<WakeCause, SleepNotPossible>>,
}

impl StatusSnapshot {
    /// Builds a snapshot for a node that has not slept yet.
    #[must_use]
    pub const fn idle(clock_ms: u32, transport_ready: bool) -> Self {
        Self {
            clock_ms,
            transport_ready,
            pending_wake: NO_WAKE_PENDING,
            last_sleep: None,
        }
    }
}

/// Renders a [`StatusSnapshot`] into human-readable lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a StatusSnapshot,
}

impl<'a> StatusFormatter<'a> {
    /// Creates a new formatter for the provided snapshot.
    #[must_use]
    pub const fn new(snapshot: &'a StatusSnapshot) -> Self {
        Self { snapshot }
    }

    /// Writes the clock line (e.g. `clock 9500ms`).
    pub fn write_clock_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "clock {}ms", self.snapshot.clock_ms)
    }

    /// Writes the transport line (e.g. `transport ready`).
    pub fn write_transport_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("transport ")?;
        writer.write_str(if self.snapshot.transport_ready {
            "ready"
        } else {
            "not-ready"
        })
    }

    /// Writes the wake line (e.g. `wake pending=none last=interrupt 5`).
    pub fn write_wake_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("wake pending=")?;
        match self.snapshot.pending_wake {
            NO_WAKE_PENDING => writer.write_str("none")?,
            cause => write!(writer, "{cause}")?,
        }

        writer.write_str(" last=")?;
        match &self.snapshot.last_sleep {
            None => writer.write_str("n/a"),
            Some(Ok(cause)) => write!(writer, "{cause}"),
            Some(Err(SleepNotPossible)) => writer.write_str("not-possible"),
        }
    }
}
