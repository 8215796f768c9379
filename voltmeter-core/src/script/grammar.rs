//! Line grammar for scripted input.
//!
//! Each non-blank line holds one directive:
//!
//! ```text
//! <command> [x<count>]      select | up | down | left | right | idle
//! wait <n>ms | wait <n>s        at least one control tick
//! adc <raw>
//! ```
//!
//! Keywords are case-insensitive and `#` starts a comment.

use core::time::Duration;

use winnow::ascii::{alpha1, dec_uint, space0};
use winnow::combinator::{alt, preceded, terminated};
use winnow::prelude::*;

use super::{ScriptErrorKind, ScriptStep};
use crate::command::JoystickCommand;
use crate::config::CYCLE_TIME;

#[derive(Clone, Copy)]
enum Unit {
    Millis,
    Seconds,
}

/// Parses one script line. Blank and comment-only lines yield `Ok(None)`.
pub(super) fn parse_line(line: &str) -> Result<Option<ScriptStep>, ScriptErrorKind> {
    let content = match line.split_once('#') {
        Some((before, _)) => before,
        None => line,
    }
    .trim();
    if content.is_empty() {
        return Ok(None);
    }

    let mut input = content;
    let keyword = directive
        .parse_next(&mut input)
        .map_err(|_| ScriptErrorKind::UnknownDirective)?;

    let step = if keyword.eq_ignore_ascii_case("wait") {
        let duration = duration_literal
            .parse_next(&mut input)
            .map_err(|_| ScriptErrorKind::InvalidDuration)?;
        if duration < CYCLE_TIME {
            return Err(ScriptErrorKind::InvalidDuration);
        }
        ScriptStep::Wait(duration)
    } else if keyword.eq_ignore_ascii_case("adc") {
        let raw = adc_reading
            .parse_next(&mut input)
            .map_err(|_| ScriptErrorKind::InvalidNumber)?;
        ScriptStep::Adc(raw)
    } else {
        let command = command_named(keyword).ok_or(ScriptErrorKind::UnknownDirective)?;
        let repeat = if input.starts_with(['x', 'X']) {
            repeat_count
                .parse_next(&mut input)
                .map_err(|_| ScriptErrorKind::InvalidNumber)?
        } else {
            1
        };
        if repeat == 0 {
            return Err(ScriptErrorKind::InvalidNumber);
        }
        ScriptStep::Press { command, repeat }
    };

    if input.is_empty() {
        Ok(Some(step))
    } else {
        Err(ScriptErrorKind::TrailingInput)
    }
}

fn command_named(keyword: &str) -> Option<JoystickCommand> {
    JoystickCommand::ALL
        .into_iter()
        .find(|command| command.label().eq_ignore_ascii_case(keyword))
}

fn directive<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    terminated(alpha1, space0).parse_next(input)
}

fn repeat_count(input: &mut &str) -> ModalResult<u32> {
    preceded(alt(('x', 'X')), dec_uint).parse_next(input)
}

fn adc_reading(input: &mut &str) -> ModalResult<u16> {
    dec_uint.parse_next(input)
}

fn duration_literal(input: &mut &str) -> ModalResult<Duration> {
    (
        dec_uint::<_, u32, _>,
        alt(("ms".value(Unit::Millis), "s".value(Unit::Seconds))),
    )
        .map(|(amount, unit)| match unit {
            Unit::Millis => Duration::from_millis(amount.into()),
            Unit::Seconds => Duration::from_secs(amount.into()),
        })
        .parse_next(input)
}
