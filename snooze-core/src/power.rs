//! Power-down primitive seam.
//!
//! Implemented by the firmware over the real low-power timer and by the
//! emulator over a virtual clock. The scheduler treats one `power_down`
//! call as opaque and atomic: program the countdown, halt, return at
//! expiry or on any asynchronous interrupt.

use crate::increments::SleepSpan;

/// Hardware halt primitive plus the analog-subsystem save/restore bracket.
pub trait PowerDown {
    /// Snapshot of analog-subsystem state captured before the first halt.
    ///
    /// Ownership enforces the lifecycle: `save` produces the snapshot once
    /// per sleep operation and `restore` consumes it exactly once.
    type Saved;

    /// Captures analog state and powers down subsystems that must not run
    /// while halted (e.g. the ADC).
    fn save(&mut self) -> Self::Saved;

    /// Restores the state captured by [`save`](PowerDown::save).
    fn restore(&mut self, saved: Self::Saved);

    /// Programs the countdown for `span` and halts the processor.
    ///
    /// Must commit to the halt atomically with respect to becoming
    /// interrupt-responsive, so a wake event arriving between "enable
    /// interrupts" and "halt" cannot be missed. Returns when the countdown
    /// expires or any interrupt handler has run.
    fn power_down(&mut self, span: SleepSpan);
}
