//! Embassy drivers behind the core's hardware traits.

use embassy_stm32::adc::{Adc, AnyAdcChannel, Resolution, SampleTime};
use embassy_stm32::gpio::{Input, Output};
use embassy_stm32::peripherals::ADC1;
use voltmeter_core::alert::Buzzer;
use voltmeter_core::sampler::AnalogInput;

use crate::joystick::JoystickLevels;

/// Single-channel blocking ADC reader for the measured voltage.
pub struct AdcInput<'d> {
    adc: Adc<'d, ADC1>,
    channel: AnyAdcChannel<ADC1>,
}

impl<'d> AdcInput<'d> {
    /// Configures `adc` for 10-bit conversions of `channel`.
    pub fn new(mut adc: Adc<'d, ADC1>, channel: AnyAdcChannel<ADC1>) -> Self {
        adc.set_resolution(Resolution::BITS10);
        adc.set_sample_time(SampleTime::CYCLES79_5);
        Self { adc, channel }
    }
}

impl AnalogInput for AdcInput<'_> {
    fn read_raw(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.channel)
    }
}

/// Buzzer driven directly from a push-pull GPIO.
pub struct PinBuzzer<'d> {
    pin: Output<'d>,
}

impl<'d> PinBuzzer<'d> {
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }
}

impl Buzzer for PinBuzzer<'_> {
    fn set_active(&mut self, active: bool) {
        if active {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}

/// The five joystick switches, each pulled up and shorted to ground when pressed.
pub struct JoystickPins<'d> {
    pub up: Input<'d>,
    pub down: Input<'d>,
    pub left: Input<'d>,
    pub right: Input<'d>,
    pub select: Input<'d>,
}

impl JoystickPins<'_> {
    pub fn levels(&self) -> JoystickLevels {
        JoystickLevels {
            up: self.up.is_low(),
            down: self.down.is_low(),
            left: self.left.is_low(),
            right: self.right.is_low(),
            select: self.select.is_low(),
        }
    }
}
