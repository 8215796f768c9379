//! Human-readable status dump.
//!
//! [`StatusSnapshot`] captures everything an operator would want to see about
//! the controller at one instant. The firmware logs it on every transition and
//! the emulator prints it on request; [`StatusFormatter`] keeps the text the
//! same in both places.

use core::fmt;
use core::time::Duration;

use crate::command::JoystickCommand;
use crate::editor::{DigitIndex, SetValue};
use crate::fsm::DeviceState;

/// Point-in-time view of the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusSnapshot {
    pub state: DeviceState,
    pub set_value: SetValue,
    /// Command consumed by the most recent tick.
    pub command: JoystickCommand,
    /// Digit blinking on the display, if any.
    pub flashing: Option<DigitIndex>,
    /// Moving average of the current measurement session.
    pub averaged_volts: Option<f32>,
    /// Measurement on the display, in hundredths of a volt.
    pub shown_measurement: Option<u16>,
    pub buzzer_active: bool,
    /// Time left before the idle alert fires; only counted down in `WAIT1`.
    pub sleep_in: Option<Duration>,
    pub in_state_for: Duration,
}

/// Helper that renders a [`StatusSnapshot`] into human-readable lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a StatusSnapshot,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(snapshot: &'a StatusSnapshot) -> Self {
        Self { snapshot }
    }

    /// Writes the state line (e.g. `state SET1 (editing the set value) set=12.34V flash=1 command=up`).
    pub fn write_state_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let set = self.snapshot.set_value.hundredths();
        write!(
            writer,
            "state {} ({}) set={}.{:02}V flash=",
            self.snapshot.state,
            self.snapshot.state.description(),
            set / 100,
            set % 100
        )?;
        match self.snapshot.flashing {
            Some(digit) => write!(writer, "{digit}")?,
            None => writer.write_char('-')?,
        }
        write!(writer, " command={}", self.snapshot.command)
    }

    /// Writes the measurement line (e.g. `measure avg=2.50V shown=2.50V buzzer=off sleep-in=- in-state=+1.2s`).
    pub fn write_measure_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("measure avg=")?;
        match self.snapshot.averaged_volts {
            Some(volts) => write!(writer, "{volts:.2}V")?,
            None => writer.write_str("n/a")?,
        }

        writer.write_str(" shown=")?;
        match self.snapshot.shown_measurement {
            Some(hundredths) => write!(writer, "{}.{:02}V", hundredths / 100, hundredths % 100)?,
            None => writer.write_str("n/a")?,
        }

        writer.write_str(" buzzer=")?;
        writer.write_str(if self.snapshot.buzzer_active {
            "on"
        } else {
            "off"
        })?;

        writer.write_str(" sleep-in=")?;
        match self.snapshot.sleep_in {
            Some(remaining) => write_duration(writer, remaining)?,
            None => writer.write_char('-')?,
        }

        writer.write_str(" in-state=")?;
        write_duration(writer, self.snapshot.in_state_for)
    }
}

fn write_duration<W: fmt::Write>(writer: &mut W, duration: Duration) -> fmt::Result {
    if duration >= Duration::from_secs(1) {
        let millis = duration.as_millis();
        let seconds = millis / 1_000;
        let tenths = (millis % 1_000) / 100;
        write!(writer, "+{seconds}.{tenths}s")
    } else {
        write!(writer, "+{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            state: DeviceState::Set1,
            set_value: SetValue::new(1234),
            command: JoystickCommand::Up,
            flashing: DigitIndex::new(1),
            averaged_volts: None,
            shown_measurement: None,
            buzzer_active: false,
            sleep_in: None,
            in_state_for: Duration::from_millis(1_250),
        }
    }

    #[test]
    fn state_line_shows_flashing_digit() {
        let snapshot = snapshot();
        let mut out: String<96> = String::new();
        StatusFormatter::new(&snapshot)
            .write_state_line(&mut out)
            .unwrap();
        assert_eq!(out.as_str(), "state SET1 (editing the set value) set=12.34V flash=1 command=up");
    }

    #[test]
    fn measure_line_reports_missing_values() {
        let snapshot = snapshot();
        let mut out: String<96> = String::new();
        StatusFormatter::new(&snapshot)
            .write_measure_line(&mut out)
            .unwrap();
        assert_eq!(
            out.as_str(),
            "measure avg=n/a shown=n/a buzzer=off sleep-in=- in-state=+1.2s"
        );
    }

    #[test]
    fn measure_line_formats_reading() {
        let mut snapshot = snapshot();
        snapshot.state = DeviceState::Measure;
        snapshot.averaged_volts = Some(2.5);
        snapshot.shown_measurement = Some(250);
        snapshot.buzzer_active = true;
        snapshot.in_state_for = Duration::from_millis(40);
        let mut out: String<96> = String::new();
        StatusFormatter::new(&snapshot)
            .write_measure_line(&mut out)
            .unwrap();
        assert_eq!(
            out.as_str(),
            "measure avg=2.50V shown=2.50V buzzer=on sleep-in=- in-state=+40ms"
        );
    }

    #[test]
    fn idle_countdown_shows_in_measure_line() {
        let mut snapshot = snapshot();
        snapshot.state = DeviceState::Wait1;
        snapshot.sleep_in = Some(Duration::from_millis(28_750));
        let mut out: String<96> = String::new();
        StatusFormatter::new(&snapshot)
            .write_measure_line(&mut out)
            .unwrap();
        assert_eq!(
            out.as_str(),
            "measure avg=n/a shown=n/a buzzer=off sleep-in=+28.7s in-state=+1.2s"
        );

        out.clear();
        StatusFormatter::new(&snapshot)
            .write_state_line(&mut out)
            .unwrap();
        assert!(out.starts_with("state WAIT1 (waiting for operator input) set=12.34V"));
    }
}
