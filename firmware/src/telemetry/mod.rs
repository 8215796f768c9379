#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Logging hooks for control-loop telemetry.
//!
//! The core keeps its own bounded history of events; this module mirrors new
//! records to defmt on the MCU, or stdout on the host, so bring-up does not need
//! a debugger attached to read the ring.

use heapless::String;
use voltmeter_core::display::DisplayFrame;
use voltmeter_core::status::{StatusFormatter, StatusSnapshot};
use voltmeter_core::telemetry::{TelemetryPayload, TelemetryRecord};

use crate::hw::FirmwareInstant;

/// Longest rendered status line.
const STATUS_LINE_CAPACITY: usize = 96;

/// Logs one telemetry record.
pub fn log_record(record: &TelemetryRecord<FirmwareInstant>) {
    let at_ms = record.timestamp.as_millis();
    match record.details {
        TelemetryPayload::Transition(details) => {
            let dwell_ms = u64::try_from(details.dwell.as_millis()).unwrap_or(u64::MAX);
            emit_transition(
                record.id,
                at_ms,
                details.from.label(),
                record.event.to_raw(),
                dwell_ms,
            );
        }
        TelemetryPayload::Value(hundredths) => {
            emit_value(record.id, at_ms, record.event.to_raw(), hundredths);
        }
        TelemetryPayload::None => emit_event(record.id, at_ms, record.event.to_raw()),
    }
}

/// Logs the two status lines for `snapshot`.
pub fn log_status(snapshot: &StatusSnapshot) {
    let formatter = StatusFormatter::new(snapshot);
    let mut line: String<STATUS_LINE_CAPACITY> = String::new();
    if formatter.write_state_line(&mut line).is_ok() {
        emit_line(line.as_str());
    }
    line.clear();
    if formatter.write_measure_line(&mut line).is_ok() {
        emit_line(line.as_str());
    }
}

/// Logs a display repaint.
pub fn log_frame(frame: DisplayFrame) {
    let flashing = frame.flashing.map_or(u8::MAX, |digit| digit.get());
    emit_frame(frame.value, flashing);
}

#[cfg(target_os = "none")]
fn emit_transition(id: u32, at_ms: u64, from: &'static str, code: u16, dwell_ms: u64) {
    defmt::info!(
        "telemetry#{} t={}ms code={=u16:#x} from={} dwell={}ms",
        id,
        at_ms,
        code,
        from,
        dwell_ms
    );
}

#[cfg(not(target_os = "none"))]
fn emit_transition(id: u32, at_ms: u64, from: &'static str, code: u16, dwell_ms: u64) {
    println!("telemetry#{id} t={at_ms}ms code={code:#x} from={from} dwell={dwell_ms}ms");
}

#[cfg(target_os = "none")]
fn emit_value(id: u32, at_ms: u64, code: u16, hundredths: u16) {
    defmt::info!(
        "telemetry#{} t={}ms code={=u16:#x} value={}cV",
        id,
        at_ms,
        code,
        hundredths
    );
}

#[cfg(not(target_os = "none"))]
fn emit_value(id: u32, at_ms: u64, code: u16, hundredths: u16) {
    println!("telemetry#{id} t={at_ms}ms code={code:#x} value={hundredths}cV");
}

#[cfg(target_os = "none")]
fn emit_event(id: u32, at_ms: u64, code: u16) {
    defmt::info!("telemetry#{} t={}ms code={=u16:#x}", id, at_ms, code);
}

#[cfg(not(target_os = "none"))]
fn emit_event(id: u32, at_ms: u64, code: u16) {
    println!("telemetry#{id} t={at_ms}ms code={code:#x}");
}

#[cfg(target_os = "none")]
fn emit_line(line: &str) {
    defmt::info!("{}", line);
}

#[cfg(not(target_os = "none"))]
fn emit_line(line: &str) {
    println!("{line}");
}

#[cfg(target_os = "none")]
fn emit_frame(hundredths: u16, flashing: u8) {
    defmt::debug!("display {}cV flash={}", hundredths, flashing);
}

#[cfg(not(target_os = "none"))]
fn emit_frame(hundredths: u16, flashing: u8) {
    println!("display {hundredths}cV flash={flashing}");
}
