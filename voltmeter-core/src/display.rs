//! Display sink contract and the measurement repaint filter.

use core::fmt;

use crate::config::{MAX_VALUE, NOISE_THRESHOLD_VOLTS};
use crate::editor::DigitIndex;

/// Everything the display driver needs to paint one tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DisplayFrame {
    /// Value in hundredths of a volt, within `0..=MAX_VALUE`.
    pub value: u16,
    /// Digit to blink, if any.
    pub flashing: Option<DigitIndex>,
}

impl DisplayFrame {
    #[must_use]
    pub const fn new(value: u16, flashing: Option<DigitIndex>) -> Self {
        Self { value, flashing }
    }
}

impl fmt::Display for DisplayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}", self.value / 100, self.value % 100)?;
        match self.flashing {
            Some(digit) => write!(f, " flash={digit}"),
            None => f.write_str(" flash=-"),
        }
    }
}

/// Receiver of the rendered value; one call per control tick.
pub trait DisplaySink {
    fn render(&mut self, frame: DisplayFrame);
}

/// Sink that discards every frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn render(&mut self, _: DisplayFrame) {}
}

/// Converts volts into the display's hundredths representation.
///
/// Negative and non-finite inputs map to zero; large inputs clamp to [`MAX_VALUE`].
#[must_use]
pub fn volts_to_hundredths(volts: f32) -> u16 {
    let scaled = volts * 100.0 + 0.5;
    if scaled.is_nan() || scaled <= 0.0 {
        return 0;
    }
    if scaled >= f32::from(MAX_VALUE) {
        return MAX_VALUE;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let hundredths = scaled as u16;
    hundredths
}

/// Suppresses display updates for averaged readings that only moved by noise.
///
/// Readings are compared against the last value shown, not the previous
/// average. After a slow drift or a small step the display can therefore stay
/// up to the threshold away from the settled average until the input moves
/// again.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NoiseGate {
    threshold: f32,
    shown: Option<f32>,
}

impl NoiseGate {
    /// Creates a gate that passes changes strictly larger than `threshold` volts.
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self {
            threshold,
            shown: None,
        }
    }

    /// Offers a new reading. Returns the value to show when it should replace
    /// the current one, `None` when the change is within the threshold.
    pub fn offer(&mut self, volts: f32) -> Option<f32> {
        let changed = match self.shown {
            None => true,
            Some(shown) => {
                let delta = if volts > shown {
                    volts - shown
                } else {
                    shown - volts
                };
                delta > self.threshold
            }
        };

        if changed {
            self.shown = Some(volts);
            Some(volts)
        } else {
            None
        }
    }

    /// Reading currently on the display, if any.
    #[must_use]
    pub const fn shown(&self) -> Option<f32> {
        self.shown
    }

    /// Forgets the shown reading so the next offer always passes.
    pub fn reset(&mut self) {
        self.shown = None;
    }
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new(NOISE_THRESHOLD_VOLTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reading_always_passes() {
        let mut gate = NoiseGate::default();
        assert_eq!(gate.offer(1.0), Some(1.0));
        assert_eq!(gate.shown(), Some(1.0));
    }

    #[test]
    fn small_moves_are_held_and_large_moves_pass() {
        let mut gate = NoiseGate::default();
        gate.offer(2.50);
        assert_eq!(gate.offer(2.55), None);
        assert_eq!(gate.offer(2.45), None);
        assert_eq!(gate.shown(), Some(2.50));
        assert_eq!(gate.offer(2.80), Some(2.80));
        assert_eq!(gate.offer(2.50), Some(2.50));
    }

    #[test]
    fn drift_is_compared_against_the_shown_value() {
        let mut gate = NoiseGate::default();
        gate.offer(1.0);
        assert_eq!(gate.offer(1.15), None);
        assert_eq!(gate.offer(1.30), Some(1.30));
    }

    #[test]
    fn settled_average_can_stay_within_threshold_of_display() {
        let mut gate = NoiseGate::default();
        gate.offer(2.50);
        for average in [2.55, 2.65] {
            assert_eq!(gate.offer(average), None);
        }
        assert_eq!(gate.offer(2.71), Some(2.71));
        for _ in 0..50 {
            assert_eq!(gate.offer(2.80), None);
        }
        assert_eq!(gate.shown(), Some(2.71));
    }

    #[test]
    fn reset_lets_the_next_reading_through() {
        let mut gate = NoiseGate::default();
        gate.offer(3.0);
        gate.reset();
        assert_eq!(gate.offer(3.01), Some(3.01));
    }

    #[test]
    fn hundredths_round_and_clamp() {
        assert_eq!(volts_to_hundredths(2.5024), 250);
        assert_eq!(volts_to_hundredths(2.5051), 251);
        assert_eq!(volts_to_hundredths(-1.0), 0);
        assert_eq!(volts_to_hundredths(f32::NAN), 0);
        assert_eq!(volts_to_hundredths(250.0), MAX_VALUE);
    }
}
