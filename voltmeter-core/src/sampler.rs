//! Analog front end: raw converter reads, volt conversion, and smoothing.
//!
//! The sampler owns the only copy of the averaging window. Resetting it on
//! `MEASURE` entry guarantees a new measurement session never averages in
//! readings taken before the operator asked for one.

use heapless::HistoryBuf;

use crate::config::{ADC_MAX, AVERAGING_BUFFER_SIZE, VCC_VOLTS};

/// Source of raw converter readings for the measurement channel.
pub trait AnalogInput {
    /// Reads one sample. Implementations never fail; values above
    /// [`ADC_MAX`] are tolerated and clamped by the caller.
    fn read_raw(&mut self) -> u16;
}

/// Analog input that reports whatever reading was last stored.
///
/// Used by the emulator and by tests in place of a real converter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FixedAnalogInput {
    raw: u16,
}

impl FixedAnalogInput {
    /// Creates an input that reports `raw` until changed.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self { raw }
    }

    /// Replaces the reported reading.
    pub fn set(&mut self, raw: u16) {
        self.raw = raw;
    }

    /// Returns the reported reading.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.raw
    }
}

impl AnalogInput for FixedAnalogInput {
    fn read_raw(&mut self) -> u16 {
        self.raw
    }
}

/// Converts a raw reading into volts, clamping out-of-range values to full scale.
#[must_use]
pub fn adc_to_volts(raw: u16) -> f32 {
    let clamped = raw.min(ADC_MAX);
    f32::from(clamped) * VCC_VOLTS / f32::from(ADC_MAX)
}

/// Fixed-window moving average over the most recent `N` samples.
///
/// Until the window fills, the average covers only the samples seen so far.
pub struct MovingAverage<const N: usize = AVERAGING_BUFFER_SIZE> {
    window: HistoryBuf<f32, N>,
}

impl<const N: usize> MovingAverage<N> {
    /// Creates an empty window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            window: HistoryBuf::new(),
        }
    }

    /// Folds `value` into the window and returns the new average.
    pub fn push(&mut self, value: f32) -> f32 {
        self.window.write(value);
        self.average().unwrap_or(value)
    }

    /// Returns the average of the samples currently held, if any.
    #[must_use]
    pub fn average(&self) -> Option<f32> {
        let samples = self.window.as_slice();
        if samples.is_empty() {
            return None;
        }

        let count = u16::try_from(samples.len()).unwrap_or(u16::MAX);
        let sum: f32 = samples.iter().sum();
        Some(sum / f32::from(count))
    }

    /// Drops every held sample.
    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns `true` when no samples are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Returns `true` once `N` samples have been folded in.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.window.is_full()
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the analog input once per call and keeps the smoothed voltage.
pub struct AnalogSampler<A, const N: usize = AVERAGING_BUFFER_SIZE> {
    input: A,
    window: MovingAverage<N>,
    last_raw: Option<u16>,
}

impl<A: AnalogInput, const N: usize> AnalogSampler<A, N> {
    /// Wraps `input` with an empty averaging window.
    pub const fn new(input: A) -> Self {
        Self {
            input,
            window: MovingAverage::new(),
            last_raw: None,
        }
    }

    /// Reads one sample, folds it into the window, and returns the average in volts.
    pub fn sample(&mut self) -> f32 {
        let raw = self.input.read_raw().min(ADC_MAX);
        self.last_raw = Some(raw);
        self.window.push(adc_to_volts(raw))
    }

    /// Discards the averaging history.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_raw = None;
    }

    /// Returns the current average without sampling.
    #[must_use]
    pub fn averaged_volts(&self) -> Option<f32> {
        self.window.average()
    }

    /// Returns the clamped raw value of the most recent sample.
    #[must_use]
    pub fn last_raw(&self) -> Option<u16> {
        self.last_raw
    }

    /// Number of samples in the current averaging window.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Shared access to the wrapped input.
    pub fn input(&self) -> &A {
        &self.input
    }

    /// Mutable access to the wrapped input.
    pub fn input_mut(&mut self) -> &mut A {
        &mut self.input
    }
}
