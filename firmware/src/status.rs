#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! The control task publishes a few atomics after every tick so other tasks
//! (currently the periodic status logger) can read the device state without
//! borrowing the state machine.

use portable_atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering};
use voltmeter_core::editor::SetValue;
use voltmeter_core::fsm::DeviceState;
use voltmeter_core::status::StatusSnapshot;

const NO_MEASUREMENT: u16 = u16::MAX;

/// `DeviceState::as_index` of the active state.
static STATE: AtomicU8 = AtomicU8::new(0);
/// Set value in hundredths of a volt.
static SET_VALUE: AtomicU16 = AtomicU16::new(0);
/// Measurement on the display in hundredths of a volt (`NO_MEASUREMENT` == none).
static SHOWN: AtomicU16 = AtomicU16::new(NO_MEASUREMENT);
/// Buzzer drive level.
static BUZZER: AtomicBool = AtomicBool::new(false);
/// Control ticks completed since boot.
static TICKS: AtomicU32 = AtomicU32::new(0);

/// Values published by the control task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishedStatus {
    pub state: DeviceState,
    pub set_value: SetValue,
    pub shown_measurement: Option<u16>,
    pub buzzer_active: bool,
    pub ticks: u32,
}

/// Stores the parts of `snapshot` other tasks care about and counts the tick.
pub fn publish(snapshot: &StatusSnapshot) {
    STATE.store(snapshot.state.as_index(), Ordering::Relaxed);
    SET_VALUE.store(snapshot.set_value.hundredths(), Ordering::Relaxed);
    SHOWN.store(
        snapshot.shown_measurement.unwrap_or(NO_MEASUREMENT),
        Ordering::Relaxed,
    );
    BUZZER.store(snapshot.buzzer_active, Ordering::Relaxed);
    TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Reads back the most recently published values.
pub fn published() -> PublishedStatus {
    let shown = match SHOWN.load(Ordering::Relaxed) {
        NO_MEASUREMENT => None,
        value => Some(value),
    };
    PublishedStatus {
        state: DeviceState::from_index(STATE.load(Ordering::Relaxed)).unwrap_or_default(),
        set_value: SetValue::new(SET_VALUE.load(Ordering::Relaxed)),
        shown_measurement: shown,
        buzzer_active: BUZZER.load(Ordering::Relaxed),
        ticks: TICKS.load(Ordering::Relaxed),
    }
}
