//! Command-line arguments.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;

use crate::config::ArrivalPolicyKind;
use crate::window::WindowSpec;
use crate::window::aggregate::MembershipStrategy;

/// Year-long EV charging site simulator.
///
/// Without `--scenario` or `--preset` the baseline preset is used.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load the scenario from a TOML file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, single, mixed, rush_hour).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override the random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the arrival policy.
    #[arg(long, value_enum)]
    pub policy: Option<ArrivalPolicyKind>,

    /// Report statistics from this date on (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`).
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDateTime>,

    /// Report statistics up to this date.
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDateTime>,

    /// Print aggregated series: hourly, daily, weekly, monthly, yearly, or a length like 90m.
    #[arg(long, value_name = "WINDOW")]
    pub aggregate: Option<WindowSpec>,

    /// How charging events are assigned to aggregation windows.
    #[arg(long, value_enum, default_value_t = MembershipStrategy::Overlap)]
    pub membership: MembershipStrategy,

    /// Write per-tick telemetry to CSV.
    #[arg(long, value_name = "PATH")]
    pub telemetry_out: Option<PathBuf>,

    /// Write charging events to CSV.
    #[arg(long, value_name = "PATH")]
    pub events_out: Option<PathBuf>,

    /// Compare 1..=N chargepoints of the scenario's first type and print the concurrency factor.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub sweep: Option<u32>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    pub verbose: bool,

    /// Start the REST API after the run.
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// API port.
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

fn parse_date(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Ok(dt);
    }
    s.parse::<NaiveDate>()
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|e| format!("\"{s}\" is not a date: {e}"))
}
