//! Scripted joystick input.
//!
//! Scripts let the emulator (or a debug console) replay an operator session
//! deterministically against simulated time. One directive per line:
//! `select`, `up x3`, `idle x10`, `wait 30s`, `adc 512`.

mod grammar;

use core::fmt;
use core::time::Duration;

#[cfg(feature = "alloc")]
use alloc::vec::Vec as AllocVec;
use heapless::Vec as HeaplessVec;

use crate::command::JoystickCommand;
use crate::config::ticks_in;

/// Maximum number of steps held by a `no_std` script buffer.
pub const MAX_SCRIPT_STEPS: usize = 64;

/// Bounded step buffer used when no allocator is available.
pub type ScriptBuffer = HeaplessVec<ScriptStep, MAX_SCRIPT_STEPS>;

/// One directive from a script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptStep {
    /// Feed `command` for `repeat` consecutive ticks.
    Press {
        command: JoystickCommand,
        repeat: u32,
    },
    /// Let time pass with no input.
    Wait(Duration),
    /// Change the simulated raw ADC reading.
    Adc(u16),
}

impl ScriptStep {
    /// Number of control ticks the step consumes.
    #[must_use]
    pub fn ticks(&self) -> u32 {
        match self {
            ScriptStep::Press { repeat, .. } => *repeat,
            ScriptStep::Wait(duration) => ticks_in(*duration),
            ScriptStep::Adc(_) => 0,
        }
    }
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStep::Press { command, repeat: 1 } => write!(f, "{command}"),
            ScriptStep::Press { command, repeat } => write!(f, "{command} x{repeat}"),
            ScriptStep::Wait(duration) => write!(f, "wait {}ms", duration.as_millis()),
            ScriptStep::Adc(raw) => write!(f, "adc {raw}"),
        }
    }
}

/// What went wrong on a script line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptErrorKind {
    UnknownDirective,
    InvalidNumber,
    InvalidDuration,
    TrailingInput,
    TooManySteps,
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScriptErrorKind::UnknownDirective => "unknown directive",
            ScriptErrorKind::InvalidNumber => "invalid number",
            ScriptErrorKind::InvalidDuration => {
                "invalid duration (expected <n>ms or <n>s, at least one tick)"
            }
            ScriptErrorKind::TrailingInput => "unexpected trailing input",
            ScriptErrorKind::TooManySteps => "script exceeds the step buffer",
        })
    }
}

/// Script parse failure, tagged with its 1-based line number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptError {
    pub line: usize,
    pub kind: ScriptErrorKind,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// Parses a single script line.
///
/// # Errors
///
/// Returns the [`ScriptErrorKind`] describing why the line was rejected.
pub fn parse_line(line: &str) -> Result<Option<ScriptStep>, ScriptErrorKind> {
    grammar::parse_line(line)
}

/// Parses a whole script into a bounded buffer.
///
/// # Errors
///
/// Fails on the first malformed line, or with
/// [`ScriptErrorKind::TooManySteps`] once [`MAX_SCRIPT_STEPS`] is exceeded.
pub fn parse_script(source: &str) -> Result<ScriptBuffer, ScriptError> {
    let mut steps = ScriptBuffer::new();
    for (index, line) in source.lines().enumerate() {
        let error = |kind| ScriptError {
            line: index + 1,
            kind,
        };
        if let Some(step) = grammar::parse_line(line).map_err(error)? {
            steps
                .push(step)
                .map_err(|_| error(ScriptErrorKind::TooManySteps))?;
        }
    }
    Ok(steps)
}

/// Parses a whole script with no step limit.
///
/// # Errors
///
/// Fails on the first malformed line.
#[cfg(feature = "alloc")]
pub fn parse_script_owned(source: &str) -> Result<AllocVec<ScriptStep>, ScriptError> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match grammar::parse_line(line) {
            Ok(step) => step.map(Ok),
            Err(kind) => Some(Err(ScriptError {
                line: index + 1,
                kind,
            })),
        })
        .collect()
}
