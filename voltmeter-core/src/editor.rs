//! Digit-wise editing of the set value.
//!
//! The set value is shown as four decimal digits, thousands first. Digit
//! index 0 addresses the thousands place and index 3 the units place, so
//! moving "left" walks towards more significant digits and wraps from the
//! thousands digit around to the units digit.

use core::fmt;

use crate::config::{DIGIT_COUNT, MAX_VALUE};

/// Set value in hundredths of a volt, always within `0..=MAX_VALUE`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct SetValue(u16);

impl SetValue {
    pub const ZERO: SetValue = SetValue(0);
    pub const MAX: SetValue = SetValue(MAX_VALUE);

    /// Creates a set value, clamping anything above [`MAX_VALUE`].
    #[must_use]
    pub const fn new(hundredths: u16) -> Self {
        if hundredths > MAX_VALUE {
            SetValue(MAX_VALUE)
        } else {
            SetValue(hundredths)
        }
    }

    /// Raw value in hundredths of a volt.
    #[must_use]
    pub const fn hundredths(self) -> u16 {
        self.0
    }

    /// Adds one unit at `digit`'s place value, saturating at [`MAX_VALUE`].
    ///
    /// Carries propagate naturally: adding 10 to 0095 yields 0105.
    #[must_use]
    pub fn increment_digit(self, digit: DigitIndex) -> Self {
        SetValue::new(self.0.saturating_add(digit.place_value()))
    }

    /// Subtracts one unit at `digit`'s place value, saturating at zero.
    #[must_use]
    pub fn decrement_digit(self, digit: DigitIndex) -> Self {
        SetValue(self.0.saturating_sub(digit.place_value()))
    }
}

impl fmt::Display for SetValue {
    /// Renders the value in volts, e.g. `12.34 V`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02} V", self.0 / 100, self.0 % 100)
    }
}

/// Direction in which the flashing-digit selection moves.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SelectionMove {
    /// Towards the thousands digit.
    Left,
    /// Towards the units digit.
    Right,
}

/// Index of the flashing digit, always within `0..DIGIT_COUNT`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct DigitIndex(u8);

impl DigitIndex {
    /// Thousands place.
    pub const MOST_SIGNIFICANT: DigitIndex = DigitIndex(0);
    /// Units place.
    pub const LEAST_SIGNIFICANT: DigitIndex = DigitIndex(DIGIT_COUNT - 1);

    /// Attempts to construct an index; `None` when out of range.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < DIGIT_COUNT {
            Some(DigitIndex(index))
        } else {
            None
        }
    }

    /// Raw index, 0 being the thousands digit.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Place value addressed by this digit (1000, 100, 10 or 1).
    #[must_use]
    pub const fn place_value(self) -> u16 {
        let mut place = 1;
        let mut remaining = DIGIT_COUNT - 1 - self.0;
        while remaining > 0 {
            place *= 10;
            remaining -= 1;
        }
        place
    }

    /// Moves the selection one digit, wrapping around at either end.
    #[must_use]
    pub const fn moved(self, direction: SelectionMove) -> Self {
        match direction {
            SelectionMove::Left => DigitIndex((self.0 + DIGIT_COUNT - 1) % DIGIT_COUNT),
            SelectionMove::Right => DigitIndex((self.0 + 1) % DIGIT_COUNT),
        }
    }
}

impl fmt::Display for DigitIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editing session over the set value: the value itself plus the selected digit.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DigitEditor {
    value: SetValue,
    selected: DigitIndex,
}

impl DigitEditor {
    /// Starts editing `value` with the thousands digit selected.
    #[must_use]
    pub const fn new(value: SetValue) -> Self {
        Self {
            value,
            selected: DigitIndex::MOST_SIGNIFICANT,
        }
    }

    #[must_use]
    pub const fn value(&self) -> SetValue {
        self.value
    }

    #[must_use]
    pub const fn selected(&self) -> DigitIndex {
        self.selected
    }

    /// Returns the selection to the thousands digit.
    pub fn reset_selection(&mut self) {
        self.selected = DigitIndex::MOST_SIGNIFICANT;
    }

    /// Adds one at the selected digit. Returns `true` when the value changed.
    pub fn increment_digit(&mut self) -> bool {
        let next = self.value.increment_digit(self.selected);
        self.replace(next)
    }

    /// Subtracts one at the selected digit. Returns `true` when the value changed.
    pub fn decrement_digit(&mut self) -> bool {
        let next = self.value.decrement_digit(self.selected);
        self.replace(next)
    }

    /// Moves the flashing digit selection and returns the new index.
    pub fn move_selection(&mut self, direction: SelectionMove) -> DigitIndex {
        self.selected = self.selected.moved(direction);
        self.selected
    }

    fn replace(&mut self, next: SetValue) -> bool {
        let changed = next != self.value;
        self.value = next;
        changed
    }
}
