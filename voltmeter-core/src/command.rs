//! Joystick commands and the source the control loop polls once per tick.

use core::fmt;

use heapless::Deque;

/// Discrete command produced by the joystick driver for one tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum JoystickCommand {
    /// Stick centred and button released.
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    /// Button pressed.
    Select,
}

impl JoystickCommand {
    /// Every command, in wire-code order.
    pub const ALL: [JoystickCommand; 6] = [
        JoystickCommand::None,
        JoystickCommand::Up,
        JoystickCommand::Down,
        JoystickCommand::Left,
        JoystickCommand::Right,
        JoystickCommand::Select,
    ];

    /// Returns `true` for anything other than [`JoystickCommand::None`].
    #[must_use]
    pub const fn is_input(self) -> bool {
        !matches!(self, JoystickCommand::None)
    }

    /// Short lowercase name used in logs and scripts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            JoystickCommand::None => "idle",
            JoystickCommand::Up => "up",
            JoystickCommand::Down => "down",
            JoystickCommand::Left => "left",
            JoystickCommand::Right => "right",
            JoystickCommand::Select => "select",
        }
    }

    /// Compact numeric code used by diagnostics transports.
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        match self {
            JoystickCommand::None => 0,
            JoystickCommand::Up => 1,
            JoystickCommand::Down => 2,
            JoystickCommand::Left => 3,
            JoystickCommand::Right => 4,
            JoystickCommand::Select => 5,
        }
    }

    /// Decodes a numeric code; unknown codes are treated as no input.
    #[must_use]
    pub const fn from_raw(code: u8) -> Self {
        match code {
            1 => JoystickCommand::Up,
            2 => JoystickCommand::Down,
            3 => JoystickCommand::Left,
            4 => JoystickCommand::Right,
            5 => JoystickCommand::Select,
            _ => JoystickCommand::None,
        }
    }
}

impl fmt::Display for JoystickCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Producer of joystick commands, polled exactly once per control tick.
pub trait CommandSource {
    /// Returns the command for the current tick, or [`JoystickCommand::None`].
    fn poll(&mut self) -> JoystickCommand;
}

/// Bounded FIFO of pending commands; each poll consumes at most one.
#[derive(Clone, Debug, Default)]
pub struct QueuedCommands<const N: usize = 8> {
    pending: Deque<JoystickCommand, N>,
}

impl<const N: usize> QueuedCommands<N> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Deque::new(),
        }
    }

    /// Appends a command. Returns it back when the queue is full.
    ///
    /// # Errors
    ///
    /// Returns the rejected command when `N` commands are already pending.
    pub fn push(&mut self, command: JoystickCommand) -> Result<(), JoystickCommand> {
        self.pending.push_back(command)
    }

    /// Number of commands waiting to be polled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<const N: usize> CommandSource for QueuedCommands<N> {
    fn poll(&mut self) -> JoystickCommand {
        self.pending.pop_front().unwrap_or_default()
    }
}
