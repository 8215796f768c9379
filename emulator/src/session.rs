use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use voltmeter_core::alert::{Buzzer, TickInstant};
use voltmeter_core::command::JoystickCommand;
use voltmeter_core::config::CYCLE_TIME;
use voltmeter_core::display::{DisplayFrame, DisplaySink};
use voltmeter_core::fsm::Voltmeter;
use voltmeter_core::sampler::{FixedAnalogInput, adc_to_volts};
use voltmeter_core::script::ScriptStep;
use voltmeter_core::status::StatusFormatter;
use voltmeter_core::telemetry::{EventId, TelemetryPayload, TelemetryRecorder};

/// Simulated monotonic clock: time since the session started.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct SimInstant(Duration);

impl SimInstant {
    pub fn elapsed(self) -> Duration {
        self.0
    }
}

impl TickInstant for SimInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

/// Buzzer that remembers its level so the terminal can show it.
#[derive(Debug, Default)]
pub struct TerminalBuzzer {
    active: bool,
}

impl TerminalBuzzer {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Buzzer for TerminalBuzzer {
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Display sink that keeps the most recent frame.
#[derive(Debug, Default)]
pub struct FrameCapture {
    last: Option<DisplayFrame>,
}

impl DisplaySink for FrameCapture {
    fn render(&mut self, frame: DisplayFrame) {
        self.last = Some(frame);
    }
}

/// Built-in scenarios recorded by `capture_transcripts`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptScenario {
    IdleAlert,
    SetAndMeasure,
    NoiseFilter,
}

impl TranscriptScenario {
    pub const ALL: [TranscriptScenario; 3] = [
        TranscriptScenario::IdleAlert,
        TranscriptScenario::SetAndMeasure,
        TranscriptScenario::NoiseFilter,
    ];

    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptScenario::IdleAlert => "transcripts/idle-alert.log",
            TranscriptScenario::SetAndMeasure => "transcripts/set-and-measure.log",
            TranscriptScenario::NoiseFilter => "transcripts/noise-filter.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptScenario::IdleAlert => "Voltmeter emulator idle alert transcript",
            TranscriptScenario::SetAndMeasure => "Voltmeter emulator set-and-measure transcript",
            TranscriptScenario::NoiseFilter => "Voltmeter emulator noise filter transcript",
        }
    }

    pub fn script(self) -> &'static str {
        match self {
            TranscriptScenario::IdleAlert => {
                "\
# no input for SLEEP_TIME raises the alert
wait 30s
# buzzer stops on its own after BUZZER_TIME
wait 1200ms
# any input clears the alert
up
idle x5
"
            }
            TranscriptScenario::SetAndMeasure => {
                "\
select
up
right
up x2
right
up x5
adc 512
select
idle x25
left
select
idle x5
select
"
            }
            TranscriptScenario::NoiseFilter => {
                "\
adc 512
select
select
idle x20
# about 0.05 V: held back
adc 522
idle x40
# about 0.3 V: repainted
adc 574
idle x40
"
            }
        }
    }
}

pub struct Session {
    meter: Voltmeter<SimInstant, FixedAnalogInput, TerminalBuzzer>,
    telemetry: TelemetryRecorder<SimInstant>,
    display: FrameCapture,
    now: SimInstant,
    next_event: EventId,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(adc: u16, transcript: Option<TranscriptLogger>) -> Self {
        let now = SimInstant::default();
        Self {
            meter: Voltmeter::new(
                FixedAnalogInput::new(adc),
                TerminalBuzzer::default(),
                now,
            ),
            telemetry: TelemetryRecorder::new(),
            display: FrameCapture::default(),
            now,
            next_event: 0,
            transcript,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.now.elapsed()
    }

    pub fn adc(&self) -> u16 {
        self.meter.sampler().input().raw()
    }

    pub fn set_adc(&mut self, raw: u16) -> io::Result<Vec<String>> {
        self.meter.sampler_mut().input_mut().set(raw);
        let line = format!("adc raw={raw} ({:.2} V)", adc_to_volts(raw));
        self.record(TranscriptRole::Input, &line)?;
        Ok(vec![line])
    }

    /// Runs one control tick and returns the device-side events it produced.
    pub fn tick(&mut self, command: JoystickCommand) -> io::Result<Vec<String>> {
        self.now = SimInstant(self.now.0 + CYCLE_TIME);
        if command.is_input() {
            self.record(TranscriptRole::Input, command.label())?;
        }

        let report = self
            .meter
            .step(command, self.now, &mut self.display, &mut self.telemetry);

        let mut lines = self.drain_telemetry();
        if report.transition.is_some() {
            lines.extend(self.status_lines());
        }
        for line in &lines {
            self.record(TranscriptRole::Device, line)?;
        }
        Ok(lines)
    }

    pub fn run_step(&mut self, step: &ScriptStep) -> io::Result<Vec<String>> {
        let command = match *step {
            ScriptStep::Adc(raw) => return self.set_adc(raw),
            ScriptStep::Press { command, .. } => command,
            ScriptStep::Wait(_) => JoystickCommand::None,
        };

        let mut lines = Vec::new();
        for _ in 0..step.ticks() {
            lines.extend(self.tick(command)?);
        }
        Ok(lines)
    }

    pub fn run_script(&mut self, steps: &[ScriptStep]) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        for step in steps {
            lines.extend(self.run_step(step)?);
        }
        let display = format!("display {}", self.render_display());
        self.record(TranscriptRole::Device, &display)?;
        lines.push(display);
        Ok(lines)
    }

    pub fn status_lines(&self) -> Vec<String> {
        let snapshot = self.meter.status(self.now);
        let formatter = StatusFormatter::new(&snapshot);
        let mut state = String::new();
        let mut measure = String::new();
        // Writing into a String cannot fail.
        let _ = formatter.write_state_line(&mut state);
        let _ = formatter.write_measure_line(&mut measure);
        vec![state, measure]
    }

    /// Renders the 4-digit display, bracketing the flashing digit.
    pub fn render_display(&self) -> String {
        let Some(frame) = self.display.last else {
            return "[ -- . -- ]".to_string();
        };

        let digits = format!("{:04}", frame.value);
        let mut rendered = String::new();
        for (index, digit) in digits.chars().enumerate() {
            if index == 2 {
                rendered.push('.');
            }
            let flashing = frame
                .flashing
                .is_some_and(|selected| usize::from(selected.get()) == index);
            if flashing {
                let _ = write!(rendered, "[{digit}]");
            } else {
                rendered.push(digit);
            }
        }

        let buzzer = if self.meter.buzzer().is_active() {
            " BUZZ"
        } else {
            ""
        };
        format!("{:<8} {rendered} V{buzzer}", self.meter.state().label())
    }

    fn drain_telemetry(&mut self) -> Vec<String> {
        let next_event = self.next_event;
        let lines = self
            .telemetry
            .oldest_first()
            .filter(|record| record.id >= next_event)
            .map(|record| {
                let at = record.timestamp.elapsed().as_millis();
                match record.details {
                    TelemetryPayload::Transition(details) => format!(
                        "+{at}ms {} from={} after={}ms ({})",
                        record.event,
                        details.from,
                        details.dwell.as_millis(),
                        details.trigger
                    ),
                    TelemetryPayload::Value(hundredths) => format!(
                        "+{at}ms {} value={}.{:02}",
                        record.event,
                        hundredths / 100,
                        hundredths % 100
                    ),
                    TelemetryPayload::None => format!("+{at}ms {}", record.event),
                }
            })
            .collect();
        self.next_event = self.telemetry.next_event_id();
        lines
    }

    fn record(&mut self, role: TranscriptRole, line: &str) -> io::Result<()> {
        let elapsed = self.now.elapsed();
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(elapsed, role, line),
            None => Ok(()),
        }
    }
}

pub struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    pub fn create(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(
            self.writer,
            "# Timestamps are simulated milliseconds since power-on"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, elapsed: Duration, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

#[derive(Clone, Copy)]
enum TranscriptRole {
    Input,
    Device,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Input => "JOY >",
            TranscriptRole::Device => "DEV <",
        }
    }
}
