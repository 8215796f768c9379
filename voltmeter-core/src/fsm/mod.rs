//! The voltmeter's finite state machine.
//!
//! [`Voltmeter`] owns every piece of mutable device state: the active
//! [`DeviceState`], its entry timestamp, the set value and flashing digit,
//! the sampler, and the buzzer. Callers drive it once per
//! [`CYCLE_TIME`](crate::config::CYCLE_TIME) with [`Voltmeter::tick`]; each
//! tick consumes exactly one command, runs exactly one state handler, and
//! ends by pushing a frame to the display.
//!
//! Transitions:
//!
//! ```text
//!            select              select
//!   WAIT1 ───────────► SET1 ───────────► MEASURE
//!    ▲ │                ▲                 │   │
//!    │ │ idle ≥ SLEEP   └── left / right ─┘   │
//!    │ ▼                                      │
//!   ALERT ── any command ─► WAIT1 ◄── select ─┘
//! ```
//!
//! Operator input always wins over a timeout that falls due in the same tick.

mod state;

use core::time::Duration;

pub use state::DeviceState;

use crate::alert::{AlertPolicy, Buzzer, BuzzerGate, SilenceReason, TickInstant};
use crate::command::{CommandSource, JoystickCommand};
use crate::display::{DisplayFrame, DisplaySink, NoiseGate, volts_to_hundredths};
use crate::editor::{DigitEditor, DigitIndex, SelectionMove, SetValue};
use crate::sampler::{AnalogInput, AnalogSampler};
use crate::status::StatusSnapshot;
use crate::telemetry::{TelemetryEventKind, TelemetryPayload, TelemetryRecorder, TransitionTrigger};

/// A state change performed during a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    pub from: DeviceState,
    pub to: DeviceState,
    pub trigger: TransitionTrigger,
}

/// Outcome of a single control tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickReport {
    /// Command consumed by this tick.
    pub command: JoystickCommand,
    /// State active at the end of the tick.
    pub state: DeviceState,
    /// Transition taken during the tick, if any.
    pub transition: Option<Transition>,
    /// Frame pushed to the display.
    pub frame: DisplayFrame,
}

/// Controller for a single voltmeter device.
pub struct Voltmeter<T, A, B>
where
    T: TickInstant,
    A: AnalogInput,
    B: Buzzer,
{
    state: DeviceState,
    entered_at: T,
    last_activity: T,
    editor: DigitEditor,
    sampler: AnalogSampler<A>,
    noise_gate: NoiseGate,
    shown_measurement: Option<u16>,
    buzzer: BuzzerGate<B>,
    policy: AlertPolicy,
    last_command: JoystickCommand,
}

impl<T, A, B> Voltmeter<T, A, B>
where
    T: TickInstant,
    A: AnalogInput,
    B: Buzzer,
{
    /// Creates a controller in `WAIT1` with the default timeouts.
    #[must_use]
    pub fn new(input: A, buzzer: B, now: T) -> Self {
        Self::with_policy(input, buzzer, AlertPolicy::default(), now)
    }

    /// Creates a controller in `WAIT1` with custom timeouts.
    #[must_use]
    pub fn with_policy(input: A, buzzer: B, policy: AlertPolicy, now: T) -> Self {
        Self {
            state: DeviceState::Wait1,
            entered_at: now,
            last_activity: now,
            editor: DigitEditor::new(SetValue::ZERO),
            sampler: AnalogSampler::new(input),
            noise_gate: NoiseGate::default(),
            shown_measurement: None,
            buzzer: BuzzerGate::new(buzzer),
            policy,
            last_command: JoystickCommand::None,
        }
    }

    /// Currently active state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Instant at which the current state was entered.
    #[must_use]
    pub fn entered_at(&self) -> T {
        self.entered_at
    }

    /// Instant of the most recent operator input or state entry.
    #[must_use]
    pub fn last_activity(&self) -> T {
        self.last_activity
    }

    #[must_use]
    pub fn set_value(&self) -> SetValue {
        self.editor.value()
    }

    /// Selected digit. Held in every state, shown only in `SET1`.
    #[must_use]
    pub fn flashing_digit(&self) -> DigitIndex {
        self.editor.selected()
    }

    /// Digit the display should blink right now.
    #[must_use]
    pub fn flashing_indicator(&self) -> Option<DigitIndex> {
        match self.state {
            DeviceState::Set1 => Some(self.editor.selected()),
            DeviceState::Wait1 | DeviceState::Alert | DeviceState::Measure => None,
        }
    }

    /// Moving average of the current measurement session, if one has started.
    #[must_use]
    pub fn averaged_volts(&self) -> Option<f32> {
        self.sampler.averaged_volts()
    }

    /// Measurement currently on the display, in hundredths of a volt.
    #[must_use]
    pub fn shown_measurement(&self) -> Option<u16> {
        self.shown_measurement
    }

    #[must_use]
    pub fn buzzer_active(&self) -> bool {
        self.buzzer.is_active()
    }

    /// Command consumed by the most recent tick.
    #[must_use]
    pub fn last_command(&self) -> JoystickCommand {
        self.last_command
    }

    #[must_use]
    pub fn sampler(&self) -> &AnalogSampler<A> {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut AnalogSampler<A> {
        &mut self.sampler
    }

    #[must_use]
    pub fn buzzer(&self) -> &B {
        self.buzzer.driver()
    }

    /// Time spent in the current state as of `now`.
    #[must_use]
    pub fn time_in_state(&self, now: T) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    /// Builds a diagnostics snapshot as of `now`.
    #[must_use]
    pub fn status(&self, now: T) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            set_value: self.editor.value(),
            command: self.last_command,
            flashing: self.flashing_indicator(),
            averaged_volts: self.sampler.averaged_volts(),
            shown_measurement: self.shown_measurement,
            buzzer_active: self.buzzer.is_active(),
            sleep_in: (self.state == DeviceState::Wait1)
                .then(|| self.policy.time_until_sleep(self.last_activity, now)),
            in_state_for: self.time_in_state(now),
        }
    }

    /// Runs one control tick: polls `commands` once, advances the active
    /// state, and renders the result to `display`.
    pub fn tick<C, D>(
        &mut self,
        now: T,
        commands: &mut C,
        display: &mut D,
        telemetry: &mut TelemetryRecorder<T>,
    ) -> TickReport
    where
        C: CommandSource,
        D: DisplaySink,
    {
        let command = commands.poll();
        self.step(command, now, display, telemetry)
    }

    /// Runs one control tick with an already-fetched command.
    pub fn step<D>(
        &mut self,
        command: JoystickCommand,
        now: T,
        display: &mut D,
        telemetry: &mut TelemetryRecorder<T>,
    ) -> TickReport
    where
        D: DisplaySink,
    {
        self.last_command = command;
        if command.is_input() {
            self.last_activity = now;
        }

        let next = match self.state {
            DeviceState::Wait1 => self.wait1_state(command, now),
            DeviceState::Alert => self.alert_state(command, now, telemetry),
            DeviceState::Set1 => self.set1_state(command, now, telemetry),
            DeviceState::Measure => self.measure_state(command, now, telemetry),
        };

        let transition = next.map(|(to, trigger)| self.transition(to, trigger, now, telemetry));

        let frame = self.frame();
        display.render(frame);

        TickReport {
            command,
            state: self.state,
            transition,
            frame,
        }
    }

    fn frame(&self) -> DisplayFrame {
        let value = match self.state {
            DeviceState::Measure => self.shown_measurement.unwrap_or(0),
            DeviceState::Wait1 | DeviceState::Alert | DeviceState::Set1 => {
                self.editor.value().hundredths()
            }
        };
        DisplayFrame::new(value, self.flashing_indicator())
    }

    fn wait1_state(
        &mut self,
        command: JoystickCommand,
        now: T,
    ) -> Option<(DeviceState, TransitionTrigger)> {
        match command {
            JoystickCommand::Select => {
                Some((DeviceState::Set1, TransitionTrigger::Command(command)))
            }
            JoystickCommand::None if self.policy.inactivity_expired(self.last_activity, now) => {
                Some((DeviceState::Alert, TransitionTrigger::Timeout))
            }
            _ => None,
        }
    }

    fn alert_state(
        &mut self,
        command: JoystickCommand,
        now: T,
        telemetry: &mut TelemetryRecorder<T>,
    ) -> Option<(DeviceState, TransitionTrigger)> {
        if command.is_input() {
            return Some((DeviceState::Wait1, TransitionTrigger::Command(command)));
        }

        if self.policy.buzzer_expired(self.entered_at, now) && self.buzzer.silence() {
            telemetry.record(
                TelemetryEventKind::BuzzerSilenced(SilenceReason::Timeout),
                TelemetryPayload::None,
                now,
            );
        }
        None
    }

    fn set1_state(
        &mut self,
        command: JoystickCommand,
        now: T,
        telemetry: &mut TelemetryRecorder<T>,
    ) -> Option<(DeviceState, TransitionTrigger)> {
        let edited = match command {
            JoystickCommand::Up => self.editor.increment_digit(),
            JoystickCommand::Down => self.editor.decrement_digit(),
            JoystickCommand::Left | JoystickCommand::Right => {
                let direction = if command == JoystickCommand::Left {
                    SelectionMove::Left
                } else {
                    SelectionMove::Right
                };
                let digit = self.editor.move_selection(direction);
                telemetry.record(
                    TelemetryEventKind::DigitSelected(digit),
                    TelemetryPayload::None,
                    now,
                );
                false
            }
            JoystickCommand::Select => {
                return Some((DeviceState::Measure, TransitionTrigger::Command(command)));
            }
            JoystickCommand::None => false,
        };

        if edited {
            telemetry.record_value(
                TelemetryEventKind::SetValueEdited,
                self.editor.value().hundredths(),
                now,
            );
        }
        None
    }

    fn measure_state(
        &mut self,
        command: JoystickCommand,
        now: T,
        telemetry: &mut TelemetryRecorder<T>,
    ) -> Option<(DeviceState, TransitionTrigger)> {
        match command {
            JoystickCommand::Select => {
                Some((DeviceState::Wait1, TransitionTrigger::Command(command)))
            }
            JoystickCommand::Left | JoystickCommand::Right => {
                Some((DeviceState::Set1, TransitionTrigger::Command(command)))
            }
            JoystickCommand::None | JoystickCommand::Up | JoystickCommand::Down => {
                self.measure(now, telemetry);
                None
            }
        }
    }

    fn measure(&mut self, now: T, telemetry: &mut TelemetryRecorder<T>) {
        let averaged = self.sampler.sample();
        if let Some(shown) = self.noise_gate.offer(averaged) {
            let hundredths = volts_to_hundredths(shown);
            self.shown_measurement = Some(hundredths);
            telemetry.record_value(TelemetryEventKind::MeasurementShown, hundredths, now);
        }
    }

    fn transition(
        &mut self,
        to: DeviceState,
        trigger: TransitionTrigger,
        now: T,
        telemetry: &mut TelemetryRecorder<T>,
    ) -> Transition {
        let from = self.state;
        debug_assert!(from.can_transition_to(to), "illegal edge {from} -> {to}");

        self.exit_state(from, now, telemetry);
        telemetry.record_transition(from, to, trigger, self.entered_at, now);

        self.state = to;
        self.entered_at = now;
        self.last_activity = now;

        self.enter_state(to, now, telemetry);

        Transition { from, to, trigger }
    }

    fn exit_state(&mut self, state: DeviceState, now: T, telemetry: &mut TelemetryRecorder<T>) {
        if state == DeviceState::Alert && self.buzzer.silence() {
            telemetry.record(
                TelemetryEventKind::BuzzerSilenced(SilenceReason::Command),
                TelemetryPayload::None,
                now,
            );
        }
    }

    fn enter_state(&mut self, state: DeviceState, now: T, telemetry: &mut TelemetryRecorder<T>) {
        match state {
            DeviceState::Wait1 => {}
            DeviceState::Alert => {
                if self.buzzer.start() {
                    telemetry.record(
                        TelemetryEventKind::BuzzerStarted,
                        TelemetryPayload::None,
                        now,
                    );
                }
            }
            DeviceState::Set1 => self.editor.reset_selection(),
            DeviceState::Measure => {
                self.sampler.reset();
                self.noise_gate.reset();
                self.shown_measurement = None;
                self.measure(now, telemetry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::NoopBuzzer;
    use crate::display::NullDisplay;
    use crate::sampler::FixedAnalogInput;

    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    struct Millis(u64);

    impl TickInstant for Millis {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }
    }

    type TestMeter = Voltmeter<Millis, FixedAnalogInput, NoopBuzzer>;

    fn meter() -> TestMeter {
        Voltmeter::new(FixedAnalogInput::new(0), NoopBuzzer, Millis(0))
    }

    fn press(
        meter: &mut TestMeter,
        telemetry: &mut TelemetryRecorder<Millis>,
        command: JoystickCommand,
        at: u64,
    ) -> TickReport {
        meter.step(command, Millis(at), &mut NullDisplay, telemetry)
    }

    #[test]
    fn starts_in_wait1_without_flashing_digit() {
        let meter = meter();
        assert_eq!(meter.state(), DeviceState::Wait1);
        assert_eq!(meter.flashing_indicator(), None);
        assert_eq!(meter.set_value(), SetValue::ZERO);
        assert!(!meter.buzzer_active());
    }

    #[test]
    fn select_cycles_wait_set_measure_wait() {
        let mut meter = meter();
        let mut telemetry = TelemetryRecorder::new();

        let report = press(&mut meter, &mut telemetry, JoystickCommand::Select, 20);
        assert_eq!(report.state, DeviceState::Set1);
        assert_eq!(report.frame.flashing, Some(DigitIndex::MOST_SIGNIFICANT));

        let report = press(&mut meter, &mut telemetry, JoystickCommand::Select, 40);
        assert_eq!(report.state, DeviceState::Measure);
        assert_eq!(report.frame.flashing, None);

        let report = press(&mut meter, &mut telemetry, JoystickCommand::Select, 60);
        assert_eq!(report.state, DeviceState::Wait1);
        assert_eq!(meter.entered_at(), Millis(60));
    }

    #[test]
    fn sideways_input_in_measure_returns_to_editing() {
        let mut meter = meter();
        let mut telemetry = TelemetryRecorder::new();
        press(&mut meter, &mut telemetry, JoystickCommand::Select, 20);
        press(&mut meter, &mut telemetry, JoystickCommand::Right, 40);
        press(&mut meter, &mut telemetry, JoystickCommand::Select, 60);

        let report = press(&mut meter, &mut telemetry, JoystickCommand::Left, 80);
        assert_eq!(report.state, DeviceState::Set1);
        assert_eq!(meter.flashing_digit(), DigitIndex::MOST_SIGNIFICANT);
    }

    #[test]
    fn transition_is_recorded_with_dwell_and_trigger() {
        let mut meter = meter();
        let mut telemetry = TelemetryRecorder::new();
        let report = press(&mut meter, &mut telemetry, JoystickCommand::Select, 500);

        let transition = report.transition.unwrap();
        assert_eq!(transition.from, DeviceState::Wait1);
        assert_eq!(
            transition.trigger,
            TransitionTrigger::Command(JoystickCommand::Select)
        );

        let record = telemetry.latest().copied().unwrap();
        match record.details {
            TelemetryPayload::Transition(details) => {
                assert_eq!(details.dwell, Duration::from_millis(500));
            }
            _ => panic!("expected transition payload"),
        }
    }

    #[test]
    fn up_edits_thousands_digit_first() {
        let mut meter = meter();
        let mut telemetry = TelemetryRecorder::new();
        press(&mut meter, &mut telemetry, JoystickCommand::Select, 20);
        press(&mut meter, &mut telemetry, JoystickCommand::Up, 40);
        assert_eq!(meter.set_value().hundredths(), 1000);
        assert_eq!(
            telemetry.latest().map(|record| record.details),
            Some(TelemetryPayload::Value(1000))
        );
    }
}
