//! Year-long, tick-based simulation of an EV charging site.
//!
//! A run flattens the configured chargepoint groups, rolls hourly arrivals,
//! matches vehicles to chargepoints under one of three arrival policies and
//! records the power drawn on every tick. Downstream, [`sim::stats`] reduces
//! the telemetry to peak/energy figures and [`window`] slices it into
//! calendar or fixed-length windows for presentation.
//!
//! ```
//! use ev_charge_sim::config::SimulationConfig;
//! use ev_charge_sim::sim::{compute_statistics, simulate};
//!
//! let mut config = SimulationConfig::single();
//! config.simulation.seed = Some(42);
//! let result = simulate(&config).unwrap();
//! let stats = compute_statistics(&config, &result.per_tick);
//! assert!(stats.concurrency_factor <= 1.0);
//! ```

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
/// Engine, arrival policies, statistics and run outputs.
pub mod sim;
pub mod window;

pub use error::{Error, Result};
