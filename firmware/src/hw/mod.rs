#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Board bindings for the voltmeter.
//!
//! Wiring on the STM32G0B1 board:
//!
//! | Signal          | Pin  | Notes                              |
//! |-----------------|------|------------------------------------|
//! | Measured input  | PA0  | ADC1_IN0, 10-bit, 0..VCC           |
//! | Buzzer          | PA8  | push-pull, high = sounding         |
//! | Joystick up     | PA6  | active low, internal pull-up       |
//! | Joystick down   | PA7  | active low, internal pull-up       |
//! | Joystick left   | PB0  | active low, internal pull-up       |
//! | Joystick right  | PB1  | active low, internal pull-up       |
//! | Joystick select | PA5  | active low, internal pull-up       |

#[cfg(target_os = "none")]
pub mod board;

use core::time::Duration;

use embassy_time::Instant;
use voltmeter_core::alert::TickInstant;

/// Embassy's monotonic clock, adapted to the core's instant trait.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    #[cfg(target_os = "none")]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    #[cfg(test)]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Instant::from_millis(millis))
    }

    pub fn as_millis(self) -> u64 {
        self.0.as_millis()
    }
}

impl TickInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        let elapsed = self.0.saturating_duration_since(earlier.0);
        Duration::from_micros(elapsed.as_micros())
    }
}
