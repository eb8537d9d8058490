//! CSV export for per-tick telemetry, charging events and aggregated series.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{Duration, NaiveDateTime};

use crate::error::Result;
use crate::sim::types::{ChargingEvent, PerTickRecord};
use crate::window::aggregate::Aggregated;

/// Timestamp layout used in every export.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn tick_time(origin: NaiveDateTime, granularity_ms: u64, tick: usize) -> String {
    let ms = (tick as i64).saturating_mul(granularity_ms as i64);
    (origin + Duration::milliseconds(ms))
        .format(TIME_FORMAT)
        .to_string()
}

fn create(path: &Path) -> Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

/// Exports per-tick telemetry to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_ticks_csv(
    ticks: &[PerTickRecord],
    origin: NaiveDateTime,
    granularity_ms: u64,
    path: &Path,
) -> Result<()> {
    write_ticks_csv(ticks, origin, granularity_ms, create(path)?)
}

/// Writes per-tick telemetry as CSV to any writer.
///
/// Columns: `tick,time,total_kw,cp_0_kw,...,cp_{n-1}_kw`. Output is
/// deterministic for identical inputs.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_ticks_csv(
    ticks: &[PerTickRecord],
    origin: NaiveDateTime,
    granularity_ms: u64,
    writer: impl Write,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let n = ticks.first().map_or(0, |r| r.power_kw.len());
    let mut header = vec!["tick".to_string(), "time".into(), "total_kw".into()];
    header.extend((0..n).map(|i| format!("cp_{i}_kw")));
    wtr.write_record(&header)?;

    for (tick, rec) in ticks.iter().enumerate() {
        let mut row = Vec::with_capacity(n + 3);
        row.push(tick.to_string());
        row.push(tick_time(origin, granularity_ms, tick));
        row.push(format!("{:.4}", rec.total_kw()));
        row.extend(rec.power_kw.iter().map(|p| format!("{p:.4}")));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports charging events to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_events_csv(
    events: &[ChargingEvent],
    origin: NaiveDateTime,
    granularity_ms: u64,
    path: &Path,
) -> Result<()> {
    write_events_csv(events, origin, granularity_ms, create(path)?)
}

/// Writes charging events as CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events_csv(
    events: &[ChargingEvent],
    origin: NaiveDateTime,
    granularity_ms: u64,
    writer: impl Write,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record([
        "chargepoint_id",
        "start_tick",
        "end_tick",
        "start_time",
        "end_time",
        "duration_ticks",
    ])?;
    for e in events {
        wtr.write_record(&[
            e.chargepoint_id.to_string(),
            e.start_tick.to_string(),
            e.end_tick.to_string(),
            tick_time(origin, granularity_ms, e.start_tick),
            tick_time(origin, granularity_ms, e.end_tick),
            e.duration_ticks().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes an aggregated series as `window_start,value` CSV.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_series_csv<T: Display>(series: &[Aggregated<T>], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["window_start", "value"])?;
    for a in series {
        wtr.write_record(&[
            a.window_start.format(TIME_FORMAT).to_string(),
            a.value.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
