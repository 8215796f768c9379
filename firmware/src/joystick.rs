#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Joystick decoding and the command queue feeding the control loop.
//!
//! The joystick task samples the switches faster than the control tick and
//! pushes one command per press into [`CommandQueue`]. The control loop drains
//! at most one command per tick through [`ChannelCommandSource`].

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use voltmeter_core::command::{CommandSource, JoystickCommand};

/// Depth of the queue between the joystick sampler and the control loop.
pub const COMMAND_QUEUE_DEPTH: usize = 4;

#[cfg(target_os = "none")]
type JoystickMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type JoystickMutex = NoopRawMutex;

/// Queue carrying decoded joystick presses.
pub type CommandQueue = Channel<JoystickMutex, JoystickCommand, COMMAND_QUEUE_DEPTH>;

/// Convenience sender type alias for the command queue.
pub type CommandSender<'a> = Sender<'a, JoystickMutex, JoystickCommand, COMMAND_QUEUE_DEPTH>;

/// Convenience receiver type alias for the command queue.
pub type CommandReceiver<'a> = Receiver<'a, JoystickMutex, JoystickCommand, COMMAND_QUEUE_DEPTH>;

/// Pressed/released state of each switch (`true` == pressed).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct JoystickLevels {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub select: bool,
}

impl JoystickLevels {
    /// Maps the switch levels to a single command. Select wins over the
    /// directions, then up, down, left, right.
    pub fn command(self) -> JoystickCommand {
        if self.select {
            JoystickCommand::Select
        } else if self.up {
            JoystickCommand::Up
        } else if self.down {
            JoystickCommand::Down
        } else if self.left {
            JoystickCommand::Left
        } else if self.right {
            JoystickCommand::Right
        } else {
            JoystickCommand::None
        }
    }
}

/// Turns sampled levels into one command per press.
///
/// A level has to be seen on two consecutive samples before it counts, and a
/// held switch reports only once.
#[derive(Clone, Copy, Debug, Default)]
pub struct PressDetector {
    candidate: JoystickCommand,
    reported: JoystickCommand,
}

impl PressDetector {
    pub const fn new() -> Self {
        Self {
            candidate: JoystickCommand::None,
            reported: JoystickCommand::None,
        }
    }

    /// Feeds one sample. Returns the command when a new press settles.
    pub fn sample(&mut self, levels: JoystickLevels) -> Option<JoystickCommand> {
        let command = levels.command();
        if command != self.candidate {
            self.candidate = command;
            return None;
        }
        if command == self.reported {
            return None;
        }
        self.reported = command;
        command.is_input().then_some(command)
    }
}

/// Pushes `command` without waiting. Returns `false` when the queue is full.
pub fn try_enqueue(sender: &CommandSender<'_>, command: JoystickCommand) -> bool {
    match sender.try_send(command) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => false,
    }
}

/// Exposes the queue receiver as the control loop's command source.
pub struct ChannelCommandSource<'a> {
    receiver: CommandReceiver<'a>,
}

impl<'a> ChannelCommandSource<'a> {
    pub fn new(receiver: CommandReceiver<'a>) -> Self {
        Self { receiver }
    }
}

impl CommandSource for ChannelCommandSource<'_> {
    fn poll(&mut self) -> JoystickCommand {
        self.receiver.try_receive().unwrap_or(JoystickCommand::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(command: JoystickCommand) -> JoystickLevels {
        let mut levels = JoystickLevels::default();
        match command {
            JoystickCommand::Up => levels.up = true,
            JoystickCommand::Down => levels.down = true,
            JoystickCommand::Left => levels.left = true,
            JoystickCommand::Right => levels.right = true,
            JoystickCommand::Select => levels.select = true,
            JoystickCommand::None => {}
        }
        levels
    }

    #[test]
    fn select_takes_priority() {
        let levels = JoystickLevels {
            up: true,
            select: true,
            ..JoystickLevels::default()
        };
        assert_eq!(levels.command(), JoystickCommand::Select);
        assert_eq!(JoystickLevels::default().command(), JoystickCommand::None);
    }

    #[test]
    fn held_switch_reports_once() {
        let mut detector = PressDetector::new();
        assert_eq!(detector.sample(pressed(JoystickCommand::Up)), None);
        assert_eq!(
            detector.sample(pressed(JoystickCommand::Up)),
            Some(JoystickCommand::Up)
        );
        for _ in 0..10 {
            assert_eq!(detector.sample(pressed(JoystickCommand::Up)), None);
        }

        assert_eq!(detector.sample(JoystickLevels::default()), None);
        assert_eq!(detector.sample(JoystickLevels::default()), None);
        assert_eq!(detector.sample(pressed(JoystickCommand::Up)), None);
        assert_eq!(
            detector.sample(pressed(JoystickCommand::Up)),
            Some(JoystickCommand::Up)
        );
    }

    #[test]
    fn single_sample_glitch_is_ignored() {
        let mut detector = PressDetector::new();
        assert_eq!(detector.sample(pressed(JoystickCommand::Left)), None);
        assert_eq!(detector.sample(JoystickLevels::default()), None);
        assert_eq!(detector.sample(JoystickLevels::default()), None);
    }

    #[test]
    fn source_yields_one_command_per_poll() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        assert!(try_enqueue(&sender, JoystickCommand::Select));
        assert!(try_enqueue(&sender, JoystickCommand::Up));

        let mut source = ChannelCommandSource::new(queue.receiver());
        assert_eq!(source.poll(), JoystickCommand::Select);
        assert_eq!(source.poll(), JoystickCommand::Up);
        assert_eq!(source.poll(), JoystickCommand::None);
    }

    #[test]
    fn full_queue_drops_presses() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        for _ in 0..COMMAND_QUEUE_DEPTH {
            assert!(try_enqueue(&sender, JoystickCommand::Down));
        }
        assert!(!try_enqueue(&sender, JoystickCommand::Down));
    }
}
