#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! The 20 ms control loop body, kept free of Embassy types so it runs in
//! host tests.

use voltmeter_core::alert::Buzzer;
use voltmeter_core::command::CommandSource;
use voltmeter_core::display::{DisplayFrame, DisplaySink};
use voltmeter_core::fsm::{TickReport, Voltmeter};
use voltmeter_core::sampler::AnalogInput;
use voltmeter_core::telemetry::{EventId, TelemetryRecorder};

use crate::hw::FirmwareInstant;
use crate::status;
use crate::telemetry::{log_frame, log_record, log_status};

/// Display sink that logs a frame only when it differs from the last one.
#[derive(Debug, Default)]
pub struct LoggedDisplay {
    last: Option<DisplayFrame>,
}

impl LoggedDisplay {
    #[cfg(test)]
    pub fn last_frame(&self) -> Option<DisplayFrame> {
        self.last
    }
}

impl DisplaySink for LoggedDisplay {
    fn render(&mut self, frame: DisplayFrame) {
        if self.last != Some(frame) {
            log_frame(frame);
            self.last = Some(frame);
        }
    }
}

/// Owns the state machine and everything a tick writes to.
pub struct ControlLoop<A: AnalogInput, B: Buzzer> {
    meter: Voltmeter<FirmwareInstant, A, B>,
    display: LoggedDisplay,
    telemetry: TelemetryRecorder<FirmwareInstant>,
    next_logged: EventId,
}

impl<A: AnalogInput, B: Buzzer> ControlLoop<A, B> {
    pub fn new(input: A, buzzer: B, now: FirmwareInstant) -> Self {
        Self {
            meter: Voltmeter::new(input, buzzer, now),
            display: LoggedDisplay::default(),
            telemetry: TelemetryRecorder::new(),
            next_logged: 0,
        }
    }

    #[cfg(test)]
    pub fn meter(&self) -> &Voltmeter<FirmwareInstant, A, B> {
        &self.meter
    }

    #[cfg(test)]
    pub fn display(&self) -> &LoggedDisplay {
        &self.display
    }

    /// Runs one tick, mirrors new telemetry to the log, and publishes status.
    pub fn tick<C: CommandSource>(&mut self, now: FirmwareInstant, commands: &mut C) -> TickReport {
        let report = self
            .meter
            .tick(now, commands, &mut self.display, &mut self.telemetry);

        let next_logged = self.next_logged;
        for record in self
            .telemetry
            .oldest_first()
            .filter(|record| record.id >= next_logged)
        {
            log_record(record);
        }
        self.next_logged = self.telemetry.next_event_id();

        let snapshot = self.meter.status(now);
        if report.transition.is_some() {
            log_status(&snapshot);
        }
        status::publish(&snapshot);

        report
    }
}
