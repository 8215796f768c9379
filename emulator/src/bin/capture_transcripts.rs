use std::io;
use std::path::Path;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptLogger, TranscriptScenario};
use voltmeter_core::script::parse_script_owned;

fn main() -> io::Result<()> {
    for scenario in TranscriptScenario::ALL {
        record_scenario(scenario)?;
    }
    Ok(())
}

fn record_scenario(scenario: TranscriptScenario) -> io::Result<()> {
    let steps = parse_script_owned(scenario.script())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    let transcript = TranscriptLogger::create(Path::new(scenario.log_path()), scenario.header())?;
    let mut session = Session::new(0, Some(transcript));
    session.run_script(&steps)?;
    println!("wrote {}", scenario.log_path());
    Ok(())
}
