//! Periodic sleep demo driving the shared controller.

use defmt::{info, warn};
use embassy_stm32::gpio::Output;
use embassy_time::Timer;
use snooze_core::indication::{Indication, IndicationSink};
use snooze_core::scheduler::SleepController;
use snooze_core::tick::NoTick;
use snooze_core::transport::{SleepConfig, Transport};
use snooze_core::wake::WakeCause;

use crate::hw::irq;
use crate::hw::power::WfiPower;

/// How long each demo cycle sleeps.
const DEMO_SLEEP_MS: u32 = 9_500;

/// How long the node stays awake between cycles.
const AWAKE_WINDOW_MS: u64 = 1_000;

/// Stand-in for a radio driver: always ready, reports the pre-sleep
/// handshake over RTT.
struct RttLink;

impl Transport for RttLink {
    fn is_ready(&mut self) -> bool {
        true
    }

    fn process(&mut self) {}

    fn notify_sleep(&mut self) {
        info!("link: sleep notice sent");
    }

    fn disable(&mut self) {
        info!("link: radio off");
    }
}

/// Drives the board LED from sleep indications: dark while halted.
struct LedIndication {
    led: Output<'static>,
}

impl IndicationSink for LedIndication {
    fn indicate(&mut self, indication: Indication) {
        match indication {
            Indication::Sleep => self.led.set_low(),
            Indication::Wakeup => self.led.set_high(),
        }
    }
}

#[embassy_executor::task]
pub async fn run(power: WfiPower, led: Output<'static>) -> ! {
    let mut controller = SleepController::new(
        power,
        RttLink,
        NoTick,
        LedIndication { led },
        &irq::MILLIS,
        &irq::WAKE_FLAG,
        SleepConfig::default(),
    );

    info!(
        "sleep controller up: reconnect timeout {} ms, listen window {} ms",
        controller.config().reconnect_timeout_ms,
        controller.config().listen_window_ms
    );

    loop {
        info!("sleeping for {} ms", DEMO_SLEEP_MS);
        match controller.request(DEMO_SLEEP_MS, true) {
            Ok(WakeCause::Timer) => info!("woke: timer"),
            Ok(WakeCause::Tick(code)) => info!("woke: tick {}", code),
            Ok(WakeCause::Interrupt(code)) => info!("woke: interrupt {}", code),
            Err(_) => warn!("sleep not possible: link never became ready"),
        }
        Timer::after_millis(AWAKE_WINDOW_MS).await;
    }
}
