//! `wfi`-based implementation of the power-down seam.
//!
//! The core halts between SysTick interrupts while the nap countdown in
//! [`irq`](super::irq) runs out. The halt is entered with interrupts
//! masked so committing to `wfi` is atomic with respect to wake events;
//! a pending event makes `wfi` fall through instead of being lost. Every
//! wakeup samples the user button, so a press ends the sleep within a
//! millisecond of wall time.
//!
//! TODO: switch to Stop 1 with the RTC wakeup timer once the RTC driver
//! is wired up; `wfi` only gates the core clock.

use cortex_m::{asm, interrupt};
use embassy_stm32::gpio::Input;
use snooze_core::increments::SleepSpan;
use snooze_core::power::PowerDown;
use snooze_core::wake::NO_WAKE_PENDING;

use super::irq;

/// Halts the core until the armed increment elapses or a wake source
/// raises the flag.
pub struct WfiPower {
    wake_button: Input<'static>,
}

impl WfiPower {
    pub fn new(wake_button: Input<'static>) -> Self {
        Self { wake_button }
    }
}

impl PowerDown for WfiPower {
    // The G0 ADC powers itself down between conversions (auto-off), so
    // there is no analog state to unwind around the halted phase.
    type Saved = ();

    fn save(&mut self) {}

    fn restore(&mut self, (): ()) {}

    fn power_down(&mut self, span: SleepSpan) {
        irq::begin_nap(span.millis());
        loop {
            // Commit to the halt with interrupts masked: a wake event
            // landing between the checks and `wfi` stays pending and makes
            // `wfi` fall through, so it cannot be missed. The handler runs
            // once the mask is lifted again.
            interrupt::disable();
            let done =
                irq::WAKE_FLAG.value() != NO_WAKE_PENDING || irq::nap_elapsed();
            if !done {
                asm::wfi();
            }
            unsafe { interrupt::enable() };

            if done {
                break;
            }
            if self.wake_button.is_low() {
                irq::WAKE_FLAG.raise(irq::BUTTON_WAKE);
            }
        }
        irq::end_nap();
    }
}
