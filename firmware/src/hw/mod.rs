//! Hardware bindings for the STM32G0 target.
//!
//! Everything here runs only on the MCU: the SysTick clock/wake plumbing
//! and the `wfi`-based implementation of the power-down seam.

pub mod irq;
pub mod power;
