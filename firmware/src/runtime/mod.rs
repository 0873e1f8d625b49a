use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};

use crate::hw::irq;
use crate::hw::power::WfiPower;

mod sleep_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals { PA0, PA1, .. } = hal::init(config);

    let mut cortex = cortex_m::Peripherals::take().expect("core peripherals already taken");
    irq::start_millis_tick(&mut cortex.SYST);

    let wake_button = Input::new(PA0, Pull::Up);
    let status_led = Output::new(PA1, Level::High, Speed::Low);

    spawner
        .spawn(sleep_task::run(WfiPower::new(wake_button), status_led))
        .expect("failed to spawn sleep task");

    core::future::pending::<()>().await;
}
