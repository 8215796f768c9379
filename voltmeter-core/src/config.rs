//! Build-time tuning for the voltmeter.
//!
//! Nothing here is configurable at runtime. Timing values are expressed as
//! [`Duration`] so the firmware and the emulator can convert them into their
//! own clock types without guessing units.

use core::time::Duration;

/// Period of one control-loop tick.
pub const CYCLE_TIME: Duration = Duration::from_millis(20);
/// Inactivity in `WAIT1` after which the device raises the idle alert.
pub const SLEEP_TIME: Duration = Duration::from_millis(30_000);
/// Longest time the buzzer sounds after entering `ALERT`.
pub const BUZZER_TIME: Duration = Duration::from_millis(1_000);

/// Smallest change in averaged voltage that is worth repainting.
pub const NOISE_THRESHOLD_VOLTS: f32 = 0.2;
/// ADC reference voltage.
pub const VCC_VOLTS: f32 = 5.0;
/// Full-scale reading of the 10-bit converter.
pub const ADC_MAX: u16 = 1023;
/// Number of samples folded into the moving average.
pub const AVERAGING_BUFFER_SIZE: usize = 20;

/// Largest set value, in hundredths of a volt (99.99 V).
pub const MAX_VALUE: u16 = 9999;
/// Decimal digits shown on the display.
pub const DIGIT_COUNT: u8 = 4;

/// Number of control ticks that fit into `duration`, rounded down.
#[must_use]
pub fn ticks_in(duration: Duration) -> u32 {
    let ticks = duration.as_micros() / CYCLE_TIME.as_micros();
    u32::try_from(ticks).unwrap_or(u32::MAX)
}
