use core::fmt;

/// Top-level device state. Exactly one is active at any time.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DeviceState {
    /// Idle, showing the set value and waiting for the operator.
    #[default]
    Wait1,
    /// Inactivity alert; the buzzer sounds for a bounded time.
    Alert,
    /// Editing the set value digit by digit.
    Set1,
    /// Continuously sampling and showing the averaged input voltage.
    Measure,
}

impl DeviceState {
    /// Every state, in wire-code order.
    pub const ALL: [DeviceState; 4] = [
        DeviceState::Wait1,
        DeviceState::Alert,
        DeviceState::Set1,
        DeviceState::Measure,
    ];

    /// Fixed short name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DeviceState::Wait1 => "WAIT1",
            DeviceState::Alert => "ALERT",
            DeviceState::Set1 => "SET1",
            DeviceState::Measure => "MEASURE",
        }
    }

    /// Fixed one-line description for diagnostics output.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            DeviceState::Wait1 => "waiting for operator input",
            DeviceState::Alert => "idle timeout, sounding alert",
            DeviceState::Set1 => "editing the set value",
            DeviceState::Measure => "measuring input voltage",
        }
    }

    /// Deterministic index for compact encodings.
    #[must_use]
    pub const fn as_index(self) -> u8 {
        match self {
            DeviceState::Wait1 => 0,
            DeviceState::Alert => 1,
            DeviceState::Set1 => 2,
            DeviceState::Measure => 3,
        }
    }

    /// Attempts to construct a [`DeviceState`] from a raw index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(DeviceState::Wait1),
            1 => Some(DeviceState::Alert),
            2 => Some(DeviceState::Set1),
            3 => Some(DeviceState::Measure),
            _ => None,
        }
    }

    /// Returns `true` when `next` is an edge of the state graph.
    ///
    /// `WAIT1 -> SET1`, `WAIT1 <-> ALERT`, `SET1 <-> MEASURE` and
    /// `MEASURE -> WAIT1`. SET1 has no way back to WAIT1 except through
    /// MEASURE, since select in SET1 always starts a measurement.
    #[must_use]
    pub const fn can_transition_to(self, next: DeviceState) -> bool {
        matches!(
            (self, next),
            (DeviceState::Wait1, DeviceState::Set1 | DeviceState::Alert)
                | (DeviceState::Alert | DeviceState::Measure, DeviceState::Wait1)
                | (DeviceState::Set1, DeviceState::Measure)
                | (DeviceState::Measure, DeviceState::Set1)
        )
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
