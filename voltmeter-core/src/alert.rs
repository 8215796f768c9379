//! Inactivity timeout and buzzer policy.
//!
//! Elapsed time is always measured against a monotonic [`TickInstant`]
//! supplied by the caller, so the same policy runs against Embassy's clock on
//! the MCU and against a simulated clock in the emulator and tests.

use core::time::Duration;

use crate::config::{BUZZER_TIME, SLEEP_TIME};

/// Monotonic instant used to timestamp state entry and operator activity.
pub trait TickInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Binary drive for the buzzer pin.
pub trait Buzzer {
    /// Drives the buzzer on (`true`) or off (`false`).
    fn set_active(&mut self, active: bool);
}

/// Buzzer that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopBuzzer;

impl Buzzer for NoopBuzzer {
    fn set_active(&mut self, _: bool) {}
}

/// Why the buzzer was switched off.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SilenceReason {
    /// Operator input cancelled the alert.
    Command,
    /// [`AlertPolicy::buzzer_time`] elapsed while the alert persisted.
    Timeout,
}

impl SilenceReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SilenceReason::Command => "command",
            SilenceReason::Timeout => "timeout",
        }
    }
}

/// Tracks the buzzer level so repeated start/silence requests are no-ops.
pub struct BuzzerGate<B> {
    driver: B,
    active: bool,
}

impl<B: Buzzer> BuzzerGate<B> {
    /// Wraps `driver`, forcing it off.
    pub fn new(mut driver: B) -> Self {
        driver.set_active(false);
        Self {
            driver,
            active: false,
        }
    }

    /// Switches the buzzer on. Returns `false` if it was already sounding.
    pub fn start(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.driver.set_active(true);
        self.active = true;
        true
    }

    /// Switches the buzzer off. Returns `false` if it was already silent.
    pub fn silence(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.driver.set_active(false);
        self.active = false;
        true
    }

    /// Returns `true` while the buzzer is sounding.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Shared access to the wrapped driver.
    pub fn driver(&self) -> &B {
        &self.driver
    }
}

/// Timing thresholds for the idle alert.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AlertPolicy {
    /// Inactivity in `WAIT1` that raises the alert.
    pub sleep_time: Duration,
    /// Longest time the buzzer sounds per alert.
    pub buzzer_time: Duration,
}

impl AlertPolicy {
    #[must_use]
    pub const fn new(sleep_time: Duration, buzzer_time: Duration) -> Self {
        Self {
            sleep_time,
            buzzer_time,
        }
    }

    /// Returns `true` once `last_activity` is at least `sleep_time` in the past.
    #[must_use]
    pub fn inactivity_expired<T: TickInstant>(&self, last_activity: T, now: T) -> bool {
        now.saturating_duration_since(last_activity) >= self.sleep_time
    }

    /// Returns `true` once the buzzer has sounded for `buzzer_time` since `alert_entered`.
    #[must_use]
    pub fn buzzer_expired<T: TickInstant>(&self, alert_entered: T, now: T) -> bool {
        now.saturating_duration_since(alert_entered) >= self.buzzer_time
    }

    /// Time left before the inactivity alert fires.
    #[must_use]
    pub fn time_until_sleep<T: TickInstant>(&self, last_activity: T, now: T) -> Duration {
        self.sleep_time
            .saturating_sub(now.saturating_duration_since(last_activity))
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(SLEEP_TIME, BUZZER_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    struct Millis(u64);

    impl TickInstant for Millis {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }
    }

    #[derive(Default)]
    struct CountingBuzzer {
        writes: u8,
        level: bool,
    }

    impl Buzzer for CountingBuzzer {
        fn set_active(&mut self, active: bool) {
            self.writes += 1;
            self.level = active;
        }
    }

    #[test]
    fn inactivity_fires_at_exactly_sleep_time() {
        let policy = AlertPolicy::default();
        assert!(!policy.inactivity_expired(Millis(0), Millis(29_999)));
        assert!(policy.inactivity_expired(Millis(0), Millis(30_000)));
        assert_eq!(
            policy.time_until_sleep(Millis(0), Millis(29_000)),
            Duration::from_millis(1_000)
        );
        assert_eq!(policy.time_until_sleep(Millis(0), Millis(40_000)), Duration::ZERO);
    }

    #[test]
    fn buzzer_window_is_measured_from_alert_entry() {
        let policy = AlertPolicy::default();
        assert!(!policy.buzzer_expired(Millis(500), Millis(1_499)));
        assert!(policy.buzzer_expired(Millis(500), Millis(1_500)));
    }

    #[test]
    fn clock_going_backwards_counts_as_no_time() {
        let policy = AlertPolicy::default();
        assert!(!policy.inactivity_expired(Millis(50_000), Millis(10)));
    }

    #[test]
    fn gate_only_touches_the_pin_on_level_changes() {
        let mut gate = BuzzerGate::new(CountingBuzzer::default());
        assert_eq!(gate.driver().writes, 1);
        assert!(!gate.silence());

        assert!(gate.start());
        assert!(!gate.start());
        assert!(gate.is_active());
        assert!(gate.driver().level);

        assert!(gate.silence());
        assert!(!gate.silence());
        assert_eq!(gate.driver().writes, 3);
        assert!(!gate.driver().level);
    }
}
