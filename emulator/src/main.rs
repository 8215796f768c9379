mod session;

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use voltmeter_core::command::{CommandSource, JoystickCommand, QueuedCommands};
use voltmeter_core::config::{ADC_MAX, CYCLE_TIME};
use voltmeter_core::script::parse_script_owned;

use session::{Session, TranscriptLogger};

const USAGE: &str =
    "Usage: voltmeter-emulator [--adc <raw>] [--transcript <path>] [--script <path> | <path>]";

/// Raw-count step applied by the `+` and `-` keys.
const ADC_STEP: u16 = 16;

#[derive(Debug, Default)]
struct Options {
    script: Option<PathBuf>,
    transcript: Option<PathBuf>,
    adc: u16,
}

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let transcript = match &options.transcript {
        Some(path) => Some(TranscriptLogger::create(
            path,
            "Voltmeter emulator session transcript",
        )?),
        None => None,
    };
    let mut session = Session::new(options.adc, transcript);

    match &options.script {
        Some(path) => run_script(&mut session, path),
        None => run_interactive(&mut session),
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--script" => options.script = Some(expect_value(&mut args, "--script")?.into()),
            "--transcript" => {
                options.transcript = Some(expect_value(&mut args, "--transcript")?.into());
            }
            "--adc" => {
                let value = expect_value(&mut args, "--adc")?;
                options.adc = value
                    .parse()
                    .map_err(|_| format!("Invalid ADC reading `{value}`"))?;
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option `{flag}`")),
            path if options.script.is_none() => options.script = Some(path.into()),
            extra => return Err(format!("Unexpected argument `{extra}`")),
        }
    }
    Ok(options)
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next()
        .ok_or_else(|| format!("Expected value after {flag}"))
}

fn run_script(session: &mut Session, path: &Path) -> io::Result<()> {
    let source = fs::read_to_string(path)?;
    let steps = parse_script_owned(&source).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {err}", path.display()),
        )
    })?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    for line in session.run_script(&steps)? {
        writeln!(writer, "{line}")?;
    }
    for line in session.status_lines() {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Restores cooked mode even when the loop exits through `?`.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

enum KeyAction {
    Command(JoystickCommand),
    AdjustAdc(i32),
    Status,
    Quit,
    Ignore,
}

fn map_key(key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Up => KeyAction::Command(JoystickCommand::Up),
        KeyCode::Down => KeyAction::Command(JoystickCommand::Down),
        KeyCode::Left => KeyAction::Command(JoystickCommand::Left),
        KeyCode::Right => KeyAction::Command(JoystickCommand::Right),
        KeyCode::Enter | KeyCode::Char(' ') => KeyAction::Command(JoystickCommand::Select),
        KeyCode::Char('+' | '=') => KeyAction::AdjustAdc(i32::from(ADC_STEP)),
        KeyCode::Char('-') => KeyAction::AdjustAdc(-i32::from(ADC_STEP)),
        KeyCode::Char('s') => KeyAction::Status,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        _ => KeyAction::Ignore,
    }
}

/// Queues a key press for the next free tick. Returns a warning line when the
/// queue is already full and the press is dropped.
fn queue_press<const N: usize>(
    pending: &mut QueuedCommands<N>,
    command: JoystickCommand,
) -> Option<String> {
    pending
        .push(command)
        .err()
        .map(|dropped| format!("joystick queue full, dropped {dropped}"))
}

fn run_interactive(session: &mut Session) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    write!(
        writer,
        "Voltmeter emulator ready. Arrows move, Enter selects, +/- change the input, s prints status, q quits.\r\n"
    )?;

    let _raw = RawModeGuard::enable()?;

    // Presses that arrive faster than the tick rate wait here, like the
    // joystick channel on the device. Each tick consumes at most one.
    let mut pending: QueuedCommands = QueuedCommands::new();

    'session: loop {
        let deadline = Instant::now() + CYCLE_TIME;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if timeout.is_zero() || !event::poll(timeout)? {
                break;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            match map_key(key) {
                KeyAction::Command(pressed) => {
                    if let Some(warning) = queue_press(&mut pending, pressed) {
                        write!(writer, "\r\n{warning}\r\n")?;
                    }
                }
                KeyAction::Ignore => {}
                KeyAction::AdjustAdc(delta) => {
                    let raw = (i32::from(session.adc()) + delta).clamp(0, i32::from(ADC_MAX));
                    let raw = u16::try_from(raw).unwrap_or(ADC_MAX);
                    for line in session.set_adc(raw)? {
                        write!(writer, "\r\n{line}\r\n")?;
                    }
                }
                KeyAction::Status => {
                    write!(writer, "\r\n")?;
                    for line in session.status_lines() {
                        write!(writer, "{line}\r\n")?;
                    }
                }
                KeyAction::Quit => break 'session,
            }
        }

        let lines = session.tick(pending.poll())?;
        if !lines.is_empty() {
            write!(writer, "\r\n")?;
        }
        for line in lines {
            write!(writer, "{line}\r\n")?;
        }
        write!(writer, "\r{}   ", session.render_display())?;
        writer.flush()?;
    }

    write!(writer, "\r\nSession closed.\r\n")?;
    writer.flush()
}
