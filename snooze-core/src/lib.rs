#![no_std]

// Shared sleep scheduling logic for the snooze node.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library and exposing the hardware seams as traits the
// other crates implement.

pub mod clock;
pub mod console;
pub mod increments;
pub mod indication;
pub mod power;
pub mod scheduler;
pub mod tick;
pub mod transport;
pub mod wake;
