//! Telemetry event catalog and the bounded ring that records it.
//!
//! Events carry compact numeric codes so they can be mirrored over a
//! diagnostics channel, and a `Display` rendering for logs and transcripts.
//! The ring keeps the most recent [`TELEMETRY_RING_CAPACITY`] records and
//! silently drops the oldest.

use core::{fmt, time::Duration};

use heapless::HistoryBuf;

use crate::alert::{SilenceReason, TickInstant};
use crate::command::JoystickCommand;
use crate::editor::DigitIndex;
use crate::fsm::DeviceState;

/// Identifier assigned to each recorded event.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 32;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    StateEntered(DeviceState),
    BuzzerStarted,
    BuzzerSilenced(SilenceReason),
    SetValueEdited,
    DigitSelected(DigitIndex),
    MeasurementShown,
    Custom(u16),
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::StateEntered(state) => write!(f, "state-entered {state}"),
            TelemetryEventKind::BuzzerStarted => f.write_str("buzzer-started"),
            TelemetryEventKind::BuzzerSilenced(reason) => {
                write!(f, "buzzer-silenced {}", reason.label())
            }
            TelemetryEventKind::SetValueEdited => f.write_str("set-value-edited"),
            TelemetryEventKind::DigitSelected(digit) => write!(f, "digit-selected {digit}"),
            TelemetryEventKind::MeasurementShown => f.write_str("measurement-shown"),
            TelemetryEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl TelemetryEventKind {
    const STATE_ENTERED_BASE: u16 = 0x0000;
    const BUZZER_STARTED_CODE: u16 = 0x0008;
    const BUZZER_SILENCED_BASE: u16 = 0x0009;
    const SET_VALUE_EDITED_CODE: u16 = 0x0010;
    const DIGIT_SELECTED_BASE: u16 = 0x0014;
    const MEASUREMENT_SHOWN_CODE: u16 = 0x0018;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            TelemetryEventKind::StateEntered(state) => {
                Self::STATE_ENTERED_BASE + state.as_index() as u16
            }
            TelemetryEventKind::BuzzerStarted => Self::BUZZER_STARTED_CODE,
            TelemetryEventKind::BuzzerSilenced(reason) => {
                Self::BUZZER_SILENCED_BASE + silence_index(reason)
            }
            TelemetryEventKind::SetValueEdited => Self::SET_VALUE_EDITED_CODE,
            TelemetryEventKind::DigitSelected(digit) => {
                Self::DIGIT_SELECTED_BASE + digit.get() as u16
            }
            TelemetryEventKind::MeasurementShown => Self::MEASUREMENT_SHOWN_CODE,
            TelemetryEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`TelemetryEventKind::Custom`].
    #[must_use]
    pub fn from_raw(code: u16) -> Self {
        match code {
            Self::BUZZER_STARTED_CODE => TelemetryEventKind::BuzzerStarted,
            Self::SET_VALUE_EDITED_CODE => TelemetryEventKind::SetValueEdited,
            Self::MEASUREMENT_SHOWN_CODE => TelemetryEventKind::MeasurementShown,
            value if (Self::STATE_ENTERED_BASE..Self::BUZZER_STARTED_CODE).contains(&value) => {
                offset_index(value - Self::STATE_ENTERED_BASE)
                    .and_then(DeviceState::from_index)
                    .map_or(TelemetryEventKind::Custom(value), |state| {
                        TelemetryEventKind::StateEntered(state)
                    })
            }
            value if (Self::BUZZER_SILENCED_BASE..Self::SET_VALUE_EDITED_CODE).contains(&value) => {
                silence_from_index(value - Self::BUZZER_SILENCED_BASE).map_or(
                    TelemetryEventKind::Custom(value),
                    TelemetryEventKind::BuzzerSilenced,
                )
            }
            value
                if (Self::DIGIT_SELECTED_BASE..Self::MEASUREMENT_SHOWN_CODE).contains(&value) =>
            {
                offset_index(value - Self::DIGIT_SELECTED_BASE)
                    .and_then(DigitIndex::new)
                    .map_or(TelemetryEventKind::Custom(value), |digit| {
                        TelemetryEventKind::DigitSelected(digit)
                    })
            }
            other => TelemetryEventKind::Custom(other),
        }
    }
}

/// What caused a state transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransitionTrigger {
    /// Operator input.
    Command(JoystickCommand),
    /// Inactivity timeout.
    Timeout,
}

impl fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionTrigger::Command(command) => write!(f, "command {command}"),
            TransitionTrigger::Timeout => f.write_str("timeout"),
        }
    }
}

/// Payloads carried alongside telemetry events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TelemetryPayload {
    /// No additional metadata accompanies the event.
    None,
    /// Details describing a state transition.
    Transition(TransitionTelemetry),
    /// A value in hundredths of a volt (set value or shown measurement).
    Value(u16),
}

/// State transition payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionTelemetry {
    pub from: DeviceState,
    pub trigger: TransitionTrigger,
    /// Time spent in `from` before leaving it.
    pub dwell: Duration,
}

impl TransitionTelemetry {
    #[must_use]
    pub const fn new(from: DeviceState, trigger: TransitionTrigger, dwell: Duration) -> Self {
        Self {
            from,
            trigger,
            dwell,
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<TInstant>
where
    TInstant: Copy,
{
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

/// Telemetry ring buffer type alias.
pub type TelemetryRing<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> =
    HistoryBuf<TelemetryRecord<TInstant>, CAPACITY>;

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryRecorder<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY>
where
    TInstant: Copy,
{
    ring: TelemetryRing<TInstant, CAPACITY>,
    next_event_id: EventId,
}

impl<TInstant, const CAPACITY: usize> TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: Copy + TickInstant,
{
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    pub fn latest(&self) -> Option<&TelemetryRecord<TInstant>> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Identifier the next record will receive.
    pub fn next_event_id(&self) -> EventId {
        self.next_event_id
    }

    /// Records an arbitrary telemetry event with the supplied payload.
    pub fn record(
        &mut self,
        event: TelemetryEventKind,
        payload: TelemetryPayload,
        timestamp: TInstant,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            details: payload,
        });

        id
    }

    /// Records entry into `to`, noting how long the device dwelt in `from`.
    pub fn record_transition(
        &mut self,
        from: DeviceState,
        to: DeviceState,
        trigger: TransitionTrigger,
        entered_from_at: TInstant,
        timestamp: TInstant,
    ) -> EventId {
        let dwell = timestamp.saturating_duration_since(entered_from_at);
        self.record(
            TelemetryEventKind::StateEntered(to),
            TelemetryPayload::Transition(TransitionTelemetry::new(from, trigger, dwell)),
            timestamp,
        )
    }

    /// Records a value-carrying event such as an edit or a repainted measurement.
    pub fn record_value(
        &mut self,
        event: TelemetryEventKind,
        hundredths: u16,
        timestamp: TInstant,
    ) -> EventId {
        self.record(event, TelemetryPayload::Value(hundredths), timestamp)
    }
}

impl<TInstant, const CAPACITY: usize> Default for TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: Copy + TickInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

const fn silence_index(reason: SilenceReason) -> u16 {
    match reason {
        SilenceReason::Command => 0,
        SilenceReason::Timeout => 1,
    }
}

fn silence_from_index(index: u16) -> Option<SilenceReason> {
    match index {
        0 => Some(SilenceReason::Command),
        1 => Some(SilenceReason::Timeout),
        _ => None,
    }
}

fn offset_index(offset: u16) -> Option<u8> {
    u8::try_from(offset).ok()
}
