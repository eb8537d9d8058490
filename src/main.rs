//! EV charging simulator entry point: CLI wiring, config loading and reporting.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use ev_charge_sim::cli::Args;
use ev_charge_sim::config::SimulationConfig;
use ev_charge_sim::error::Result;
use ev_charge_sim::io::export::{export_events_csv, export_ticks_csv, write_series_csv};
use ev_charge_sim::logging;
use ev_charge_sim::sim::types::SimulationResult;
use ev_charge_sim::sim::{compute_statistics, simulate};
use ev_charge_sim::window::WindowSpec;
use ev_charge_sim::window::aggregate::{
    Aggregated, MembershipStrategy, aggregate_charging_events, aggregate_tick_data, event_windows,
    reducers, tick_windows,
};
use ev_charge_sim::window::filter::{DateRange, filter_charging_events, filter_tick_data};

/// Rating used for sweeps when the scenario has no chargepoints.
const DEFAULT_SWEEP_POWER_KW: f64 = 11.0;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Loads the scenario (`--scenario`, then `--preset`, then baseline) and applies overrides.
fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = if let Some(path) = &args.scenario {
        SimulationConfig::from_toml_file(path)?
    } else if let Some(name) = &args.preset {
        SimulationConfig::from_preset(name)?
    } else {
        SimulationConfig::baseline()
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(policy) = args.policy {
        config.simulation.policy = policy;
    }
    config.ensure_valid()?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    if let Some(max) = args.sweep {
        return run_sweep(&config, max as usize);
    }

    let result = simulate(&config)?;
    let origin = SimulationResult::horizon_start(config.simulation.year);
    let g = config.simulation.granularity_ms;

    let range = DateRange::new(args.from, args.to);
    if range.is_inverted() {
        warn!("--from is after --to; the selected range is empty");
    }
    let ticks = filter_tick_data(&config, &result.per_tick, range);
    let events = filter_charging_events(&config, &result.events, range);
    let stats = compute_statistics(&config, ticks);

    let mut out = io::stdout().lock();
    writeln!(out, "Policy:                {}", config.simulation.policy.as_str())?;
    writeln!(out, "Chargepoints:          {}", config.chargepoint_count())?;
    writeln!(out, "Ticks:                 {}", ticks.len())?;
    writeln!(out, "Charging events:       {}", events.len())?;
    writeln!(out, "{stats}")?;

    if let Some(spec) = args.aggregate {
        print_series(&mut out, &config, &result, spec, args.membership)?;
    }
    drop(out);

    if let Some(path) = &args.telemetry_out {
        export_ticks_csv(&result.per_tick, origin, g, path)?;
        info!(path = %path.display(), "telemetry written");
    }
    if let Some(path) = &args.events_out {
        export_events_csv(&result.events, origin, g, path)?;
        info!(path = %path.display(), "events written");
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(ev_charge_sim::api::AppState {
            config,
            origin,
            result,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(ev_charge_sim::api::serve(state, addr))?;
    }

    Ok(())
}

/// Prints average power and event counts per window as CSV.
fn print_series(
    out: &mut impl Write,
    config: &SimulationConfig,
    result: &SimulationResult,
    spec: WindowSpec,
    membership: MembershipStrategy,
) -> Result<()> {
    let origin = SimulationResult::horizon_start(config.simulation.year);

    let windows = tick_windows(config, &result.per_tick, origin, spec)?;
    let power: Vec<Aggregated<String>> = aggregate_tick_data(
        config,
        &result.per_tick,
        origin,
        windows,
        reducers::average_total_kw,
    )
    .into_iter()
    .map(|a| Aggregated {
        window_start: a.window_start,
        value: format!("{:.3}", a.value),
    })
    .collect();
    writeln!(out, "\n--- Average power per {spec} window (kW) ---")?;
    write_series_csv(&power, &mut *out)?;

    let windows = event_windows(config, &result.events, origin, spec)?;
    let counts = aggregate_charging_events(
        config,
        &result.events,
        origin,
        windows,
        membership,
        reducers::event_count,
    );
    writeln!(out, "\n--- Charging events per {spec} window ---")?;
    write_series_csv(&counts, &mut *out)?;
    Ok(())
}

/// Runs the scenario with 1..=max chargepoints and prints the concurrency factor of each.
fn run_sweep(config: &SimulationConfig, max: usize) -> Result<()> {
    let power_kw = config
        .chargepoints
        .first()
        .map_or(DEFAULT_SWEEP_POWER_KW, |cp| cp.power_kw);
    info!(power_kw, max, "running chargepoint sweep");

    let mut out = io::stdout().lock();
    writeln!(out, "--- Chargepoint Sweep ({power_kw} kW) ---")?;
    for (count, cfg) in config.chargepoint_sweep(power_kw, max) {
        let result = simulate(&cfg)?;
        let stats = compute_statistics(&cfg, &result.per_tick);
        writeln!(
            out,
            "Chargepoints {count:>3}: concurrency {:.1}%, peak {:.1} kW, energy {:.0} kWh",
            stats.concurrency_factor * 100.0,
            stats.actual_max_power_kw,
            stats.total_energy_kwh
        )?;
    }
    Ok(())
}
