//! Interrupt-level clock and wake plumbing.
//!
//! SysTick is the only exception the firmware owns. While the node is
//! awake it maintains the software millisecond counter; during a nap it
//! counts the armed increment down instead. The scheduler corrects the
//! counter after each completed nap, so bumping it from the handler as
//! well would double-count the halted span.

use cortex_m::peripheral::SYST;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::exception;
use portable_atomic::{AtomicU8, AtomicU32, Ordering};
use snooze_core::clock::MillisCounter;
use snooze_core::wake::WakeFlag;

/// Cause code reported when the user button ends a sleep.
pub const BUTTON_WAKE: u8 = 1;

/// Wake flag shared between wake sources and the scheduler.
pub static WAKE_FLAG: WakeFlag = WakeFlag::new();

/// Free-running software millisecond counter.
pub static MILLIS: MillisCounter = MillisCounter::new();

const MODE_AWAKE: u8 = 0;
const MODE_NAP: u8 = 1;

/// Sentinel countdown value for an indefinite nap.
const NAP_FOREVER: u32 = u32::MAX;

static SYSTICK_MODE: AtomicU8 = AtomicU8::new(MODE_AWAKE);
static NAP_REMAINING_MS: AtomicU32 = AtomicU32::new(0);

/// SysTick reload for a 1 ms period from the 16 MHz HSI core clock.
const RELOAD_1MS: u32 = 16_000 - 1;

/// Starts the 1 ms awake cadence.
pub fn start_millis_tick(syst: &mut SYST) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(RELOAD_1MS);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}

/// Arms the nap countdown; `None` naps until a wake source fires.
pub fn begin_nap(duration_ms: Option<u32>) {
    NAP_REMAINING_MS.store(duration_ms.unwrap_or(NAP_FOREVER), Ordering::Release);
    SYSTICK_MODE.store(MODE_NAP, Ordering::Release);
}

/// Whether the armed nap countdown has run out.
pub fn nap_elapsed() -> bool {
    NAP_REMAINING_MS.load(Ordering::Acquire) == 0
}

/// Returns SysTick to maintaining the millisecond counter.
pub fn end_nap() {
    SYSTICK_MODE.store(MODE_AWAKE, Ordering::Release);
}

#[exception]
fn SysTick() {
    if SYSTICK_MODE.load(Ordering::Relaxed) == MODE_NAP {
        let remaining = NAP_REMAINING_MS.load(Ordering::Relaxed);
        if remaining > 0 && remaining != NAP_FOREVER {
            NAP_REMAINING_MS.store(remaining - 1, Ordering::Relaxed);
        }
    } else {
        MILLIS.bump();
    }
}
