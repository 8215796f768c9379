#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Portable control logic for the joystick voltmeter.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Hardware is reached only through the traits exposed by
// `sampler`, `command`, `display`, and `alert`.

pub mod alert;
pub mod command;
pub mod config;
pub mod display;
pub mod editor;
pub mod fsm;
pub mod sampler;
pub mod script;
pub mod status;
pub mod telemetry;
