use core::time::Duration;

use voltmeter_core::alert::{AlertPolicy, Buzzer, TickInstant};
use voltmeter_core::command::{JoystickCommand, QueuedCommands};
use voltmeter_core::config::CYCLE_TIME;
use voltmeter_core::display::{DisplayFrame, DisplaySink};
use voltmeter_core::editor::DigitIndex;
use voltmeter_core::fsm::{DeviceState, TickReport, Voltmeter};
use voltmeter_core::sampler::FixedAnalogInput;
use voltmeter_core::telemetry::{TelemetryEventKind, TelemetryRecorder};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct Millis(u64);

impl TickInstant for Millis {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

#[derive(Default)]
struct RecordingBuzzer {
    levels: Vec<bool>,
}

impl Buzzer for RecordingBuzzer {
    fn set_active(&mut self, active: bool) {
        self.levels.push(active);
    }
}

#[derive(Default)]
struct RecordingDisplay {
    frames: Vec<DisplayFrame>,
}

impl DisplaySink for RecordingDisplay {
    fn render(&mut self, frame: DisplayFrame) {
        self.frames.push(frame);
    }
}

struct Bench {
    meter: Voltmeter<Millis, FixedAnalogInput, RecordingBuzzer>,
    display: RecordingDisplay,
    telemetry: TelemetryRecorder<Millis>,
    now: Millis,
}

impl Bench {
    fn new() -> Self {
        Self::with_policy(AlertPolicy::default())
    }

    fn with_policy(policy: AlertPolicy) -> Self {
        Self {
            meter: Voltmeter::with_policy(
                FixedAnalogInput::new(0),
                RecordingBuzzer::default(),
                policy,
                Millis(0),
            ),
            display: RecordingDisplay::default(),
            telemetry: TelemetryRecorder::new(),
            now: Millis(0),
        }
    }

    fn cycle_ms() -> u64 {
        u64::try_from(CYCLE_TIME.as_millis()).unwrap()
    }

    fn press(&mut self, command: JoystickCommand) -> TickReport {
        self.now = Millis(self.now.0 + Self::cycle_ms());
        self.meter
            .step(command, self.now, &mut self.display, &mut self.telemetry)
    }

    fn idle_until(&mut self, millis: u64) -> TickReport {
        let mut report = self.press(JoystickCommand::None);
        while self.now.0 < millis {
            report = self.press(JoystickCommand::None);
        }
        report
    }

    fn buzzer_levels(&self) -> &[bool] {
        &self.meter.buzzer().levels
    }
}

#[test]
fn alert_fires_exactly_when_sleep_time_elapses() {
    let mut bench = Bench::new();

    let report = bench.idle_until(29_980);
    assert_eq!(report.state, DeviceState::Wait1);
    assert!(!bench.meter.buzzer_active());

    let report = bench.press(JoystickCommand::None);
    assert_eq!(bench.now, Millis(30_000));
    assert_eq!(report.state, DeviceState::Alert);
    assert!(bench.meter.buzzer_active());
    assert_eq!(bench.buzzer_levels(), &[false, true]);
}

#[test]
fn any_command_restarts_the_inactivity_timer() {
    let mut bench = Bench::new();
    bench.idle_until(19_980);
    let report = bench.press(JoystickCommand::Up);
    assert_eq!(report.state, DeviceState::Wait1);

    assert_eq!(bench.idle_until(49_980).state, DeviceState::Wait1);
    assert_eq!(bench.press(JoystickCommand::None).state, DeviceState::Alert);
}

#[test]
fn command_wins_over_timeout_in_the_same_tick() {
    let mut bench = Bench::new();
    bench.idle_until(29_980);

    let report = bench.press(JoystickCommand::Select);
    assert_eq!(report.state, DeviceState::Set1);
    assert!(!bench.meter.buzzer_active());
}

#[test]
fn alert_holds_without_input_and_buzzer_stops_after_buzzer_time() {
    let mut bench = Bench::new();
    bench.idle_until(30_000);
    assert_eq!(bench.meter.state(), DeviceState::Alert);

    bench.idle_until(30_980);
    assert!(bench.meter.buzzer_active());

    let report = bench.press(JoystickCommand::None);
    assert_eq!(report.state, DeviceState::Alert);
    assert!(!bench.meter.buzzer_active());

    let report = bench.idle_until(90_000);
    assert_eq!(report.state, DeviceState::Alert);
    assert_eq!(bench.buzzer_levels(), &[false, true, false]);
}

#[test]
fn any_command_leaves_alert_and_silences_buzzer() {
    let mut bench = Bench::new();
    bench.idle_until(30_200);
    assert!(bench.meter.buzzer_active());

    let report = bench.press(JoystickCommand::Left);
    assert_eq!(report.state, DeviceState::Wait1);
    assert!(!bench.meter.buzzer_active());

    let silenced = bench
        .telemetry
        .oldest_first()
        .filter(|record| matches!(record.event, TelemetryEventKind::BuzzerSilenced(_)))
        .count();
    assert_eq!(silenced, 1);

    // A fresh WAIT1 session needs another full SLEEP_TIME.
    assert_eq!(bench.idle_until(60_200).state, DeviceState::Wait1);
    assert_eq!(bench.press(JoystickCommand::None).state, DeviceState::Alert);
}

#[test]
fn select_enters_set1_on_thousands_digit() {
    let mut bench = Bench::new();
    let report = bench.press(JoystickCommand::Select);
    assert_eq!(report.state, DeviceState::Set1);
    assert_eq!(report.frame.flashing, Some(DigitIndex::MOST_SIGNIFICANT));

    let report = bench.press(JoystickCommand::Up);
    assert_eq!(report.frame.value, 1_000);
    assert_eq!(bench.meter.set_value().to_string(), "10.00 V");
}

#[test]
fn selection_wraps_in_both_directions() {
    let mut bench = Bench::new();
    bench.press(JoystickCommand::Select);

    let report = bench.press(JoystickCommand::Left);
    assert_eq!(report.frame.flashing, DigitIndex::new(3));
    bench.press(JoystickCommand::Up);
    assert_eq!(bench.meter.set_value().hundredths(), 1);

    let report = bench.press(JoystickCommand::Right);
    assert_eq!(report.frame.flashing, Some(DigitIndex::MOST_SIGNIFICANT));
}

#[test]
fn set_value_saturates_at_both_ends() {
    let mut bench = Bench::new();
    bench.press(JoystickCommand::Select);

    bench.press(JoystickCommand::Down);
    assert_eq!(bench.meter.set_value().hundredths(), 0);

    for digit in 0..4 {
        for _ in 0..9 {
            bench.press(JoystickCommand::Up);
        }
        if digit < 3 {
            bench.press(JoystickCommand::Right);
        }
    }
    assert_eq!(bench.meter.set_value().hundredths(), 9_999);

    bench.press(JoystickCommand::Right);
    let report = bench.press(JoystickCommand::Up);
    assert_eq!(report.frame.value, 9_999);
}

#[test]
fn set_value_survives_a_round_trip_through_wait1() {
    let mut bench = Bench::new();
    bench.press(JoystickCommand::Select);
    bench.press(JoystickCommand::Up);
    bench.press(JoystickCommand::Select);
    bench.press(JoystickCommand::Select);
    assert_eq!(bench.meter.state(), DeviceState::Wait1);

    let report = bench.press(JoystickCommand::None);
    assert_eq!(report.frame, DisplayFrame::new(1_000, None));

    let report = bench.press(JoystickCommand::Select);
    assert_eq!(report.frame, DisplayFrame::new(1_000, Some(DigitIndex::MOST_SIGNIFICANT)));
}

#[test]
fn every_tick_renders_one_frame() {
    let mut bench = Bench::new();
    let mut commands: QueuedCommands = QueuedCommands::new();
    commands.push(JoystickCommand::Select).unwrap();
    commands.push(JoystickCommand::Up).unwrap();

    for tick in 1..=5u64 {
        bench.now = Millis(tick * Bench::cycle_ms());
        bench.meter.tick(
            bench.now,
            &mut commands,
            &mut bench.display,
            &mut bench.telemetry,
        );
    }

    assert_eq!(bench.display.frames.len(), 5);
    assert_eq!(bench.meter.state(), DeviceState::Set1);
    assert_eq!(bench.meter.last_command(), JoystickCommand::None);
    assert_eq!(bench.display.frames[1].value, 1_000);
}

#[test]
fn transitions_are_recorded_in_order() {
    let mut bench = Bench::new();
    bench.press(JoystickCommand::Select);
    bench.press(JoystickCommand::Select);
    bench.press(JoystickCommand::Select);

    let entered: Vec<DeviceState> = bench
        .telemetry
        .oldest_first()
        .filter_map(|record| match record.event {
            TelemetryEventKind::StateEntered(state) => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        entered,
        [DeviceState::Set1, DeviceState::Measure, DeviceState::Wait1]
    );
}

fn short_policy() -> AlertPolicy {
    AlertPolicy::new(Duration::from_millis(100), Duration::from_millis(40))
}

fn bench_in(state: DeviceState) -> Bench {
    let mut bench = Bench::with_policy(short_policy());
    match state {
        DeviceState::Wait1 => {}
        DeviceState::Alert => {
            bench.idle_until(100);
        }
        DeviceState::Set1 => {
            bench.press(JoystickCommand::Select);
        }
        DeviceState::Measure => {
            bench.press(JoystickCommand::Select);
            bench.press(JoystickCommand::Select);
        }
    }
    assert_eq!(bench.meter.state(), state);
    bench
}

#[test]
fn short_policy_reaches_alert_and_silences_quickly() {
    let mut bench = Bench::with_policy(short_policy());
    assert_eq!(bench.idle_until(80).state, DeviceState::Wait1);
    assert_eq!(bench.press(JoystickCommand::None).state, DeviceState::Alert);
    assert!(bench.meter.buzzer_active());

    bench.idle_until(140);
    assert_eq!(bench.meter.state(), DeviceState::Alert);
    assert!(!bench.meter.buzzer_active());
    assert_eq!(bench.buzzer_levels(), &[false, true, false]);
}

#[test]
fn state_graph_matches_edge_table() {
    use DeviceState::{Alert, Measure, Set1, Wait1};

    let allowed = [
        (Wait1, Set1),
        (Wait1, Alert),
        (Alert, Wait1),
        (Set1, Measure),
        (Measure, Wait1),
        (Measure, Set1),
    ];
    for from in DeviceState::ALL {
        for to in DeviceState::ALL {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn every_command_from_every_state_follows_the_graph() {
    use DeviceState::{Alert, Measure, Set1, Wait1};
    use JoystickCommand::{Down, Left, Right, Select, Up};

    let expected: [(DeviceState, [DeviceState; 6]); 4] = [
        (Wait1, [Wait1, Wait1, Wait1, Wait1, Wait1, Set1]),
        (Alert, [Alert, Wait1, Wait1, Wait1, Wait1, Wait1]),
        (Set1, [Set1, Set1, Set1, Set1, Set1, Measure]),
        (Measure, [Measure, Measure, Measure, Set1, Set1, Wait1]),
    ];
    let commands = [JoystickCommand::None, Up, Down, Left, Right, Select];

    let mut reached = Vec::new();
    for (from, targets) in expected {
        for (command, target) in commands.into_iter().zip(targets) {
            let mut bench = bench_in(from);
            let report = bench.press(command);
            assert_eq!(report.state, target, "{from} on {command}");

            match report.transition {
                Some(transition) => {
                    assert_eq!(transition.from, from);
                    assert_eq!(transition.to, target);
                    assert!(from.can_transition_to(target), "{from} -> {target}");
                    if !reached.contains(&(from, target)) {
                        reached.push((from, target));
                    }
                }
                None => assert_eq!(target, from, "{from} on {command}"),
            }
        }
    }

    // Inactivity is the only trigger for WAIT1 -> ALERT.
    reached.push((Wait1, Alert));
    for from in DeviceState::ALL {
        for to in DeviceState::ALL {
            assert_eq!(
                reached.contains(&(from, to)),
                from.can_transition_to(to),
                "{from} -> {to} reachability"
            );
        }
    }
}
