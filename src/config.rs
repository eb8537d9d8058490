//! TOML-based simulation configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::{Error, Result};

/// Milliseconds in one hour.
pub const MS_PER_HOUR: u64 = 3_600_000;

/// Shortest accepted tick; one second keeps a year under 32 million ticks.
pub const MIN_GRANULARITY_MS: u64 = 1_000;

/// Hours in the per-hour arrival table.
pub const HOURS_PER_DAY: usize = 24;

/// Allowed range of the arrival multiplier.
pub const MULTIPLIER_RANGE: std::ops::RangeInclusive<f64> = 0.2..=2.0;

/// Slack allowed when checking that the demand distribution sums to at most one.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-9;

/// Reference hourly arrival probabilities (fraction per chargepoint per hour).
pub const REFERENCE_HOURLY_ARRIVALS: [f64; HOURS_PER_DAY] = [
    0.0094, 0.0094, 0.0094, 0.0094, 0.0094, 0.0094, 0.0094, 0.0094, // 00-07
    0.0283, 0.0283, // 08-09
    0.0566, 0.0566, 0.0566, // 10-12
    0.0755, 0.0755, 0.0755, // 13-15
    0.1038, 0.1038, 0.1038, // 16-18
    0.0472, 0.0472, 0.0472, // 19-21
    0.0094, 0.0094, // 22-23
];

/// Reference charging-need distribution as `(km, probability)` pairs.
pub const REFERENCE_DEMAND_DISTRIBUTION: [(f64, f64); 9] = [
    (0.0, 0.3431),
    (5.0, 0.0490),
    (10.0, 0.0980),
    (20.0, 0.1176),
    (30.0, 0.0882),
    (50.0, 0.1176),
    (100.0, 0.1078),
    (200.0, 0.0490),
    (300.0, 0.0294),
];

/// How arriving vehicles are matched to chargepoints when some are occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArrivalPolicyKind {
    /// A vehicle only arrives at a free chargepoint; attempts at occupied ones are lost.
    #[default]
    #[serde(alias = "PerChargepointNoArrivalIfOccupied")]
    NoArrivalIfOccupied,
    /// Each chargepoint keeps its own waiting line.
    #[serde(alias = "PerChargepointQueue")]
    PerChargepointQueue,
    /// Vehicles take any free chargepoint, otherwise wait in one shared line.
    #[serde(alias = "PerChargepointFindFreeOrGlobalQueue")]
    FindFreeOrGlobalQueue,
}

impl ArrivalPolicyKind {
    /// Identifier used in TOML files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoArrivalIfOccupied => "no-arrival-if-occupied",
            Self::PerChargepointQueue => "per-chargepoint-queue",
            Self::FindFreeOrGlobalQueue => "find-free-or-global-queue",
        }
    }
}

/// Top-level simulation configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario. Load from
/// TOML with [`SimulationConfig::from_toml_file`] or use
/// [`SimulationConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Timing, seed and policy selection.
    #[serde(default)]
    pub simulation: RunConfig,
    /// Installed chargepoint types.
    #[serde(default = "default_chargepoints")]
    pub chargepoints: Vec<ChargepointType>,
    /// Hourly arrival probabilities.
    #[serde(default)]
    pub arrivals: ArrivalConfig,
    /// Charging-need distribution and vehicle consumption.
    #[serde(default)]
    pub demand: DemandConfig,
}

/// Timing, seed and policy selection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Tick length in milliseconds; must divide one hour.
    pub granularity_ms: u64,
    /// Seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Arrival policy.
    pub policy: ArrivalPolicyKind,
    /// Calendar year the simulated horizon is laid onto for presentation.
    pub year: i32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            granularity_ms: 15 * 60 * 1000,
            seed: None,
            policy: ArrivalPolicyKind::default(),
            year: 2025,
        }
    }
}

/// A group of identical chargepoints.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChargepointType {
    /// Rated power of each chargepoint (kW).
    pub power_kw: f64,
    /// Number of chargepoints of this type.
    pub count: usize,
}

fn default_chargepoints() -> Vec<ChargepointType> {
    vec![ChargepointType {
        power_kw: 11.0,
        count: 20,
    }]
}

/// Hourly arrival probabilities.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrivalConfig {
    /// Probability of an arrival per chargepoint at the start of each hour of the day.
    pub hourly: Vec<f64>,
    /// Scales every hourly probability; must lie in `[0.2, 2.0]`.
    pub multiplier: f64,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            hourly: REFERENCE_HOURLY_ARRIVALS.to_vec(),
            multiplier: 1.0,
        }
    }
}

/// Charging-need distribution and vehicle consumption.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    /// `(km, probability)` pairs; probability mass not listed means "no charge needed".
    pub distribution: Vec<(f64, f64)>,
    /// Vehicle energy consumption (kWh per 100 km).
    pub consumption_kwh_per_100km: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            distribution: REFERENCE_DEMAND_DISTRIBUTION.to_vec(),
            consumption_kwh_per_100km: 18.0,
        }
    }
}

impl DemandConfig {
    /// Energy needed to cover `km` (kWh).
    pub fn energy_for_km(&self, km: f64) -> f64 {
        km / 100.0 * self.consumption_kwh_per_100km
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field} - {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.granularity_ms"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl SimulationConfig {
    /// Returns the baseline scenario: 20 chargepoints of 11 kW with the reference distributions.
    pub fn baseline() -> Self {
        Self {
            simulation: RunConfig::default(),
            chargepoints: default_chargepoints(),
            arrivals: ArrivalConfig::default(),
            demand: DemandConfig::default(),
        }
    }

    /// Returns a single 11 kW chargepoint with the reference distributions.
    pub fn single() -> Self {
        Self {
            chargepoints: vec![ChargepointType {
                power_kw: 11.0,
                count: 1,
            }],
            ..Self::baseline()
        }
    }

    /// Returns a mixed site (11, 22 and 50 kW) sharing one global waiting line.
    pub fn mixed() -> Self {
        Self {
            simulation: RunConfig {
                policy: ArrivalPolicyKind::FindFreeOrGlobalQueue,
                ..RunConfig::default()
            },
            chargepoints: vec![
                ChargepointType {
                    power_kw: 11.0,
                    count: 10,
                },
                ChargepointType {
                    power_kw: 22.0,
                    count: 4,
                },
                ChargepointType {
                    power_kw: 50.0,
                    count: 2,
                },
            ],
            ..Self::baseline()
        }
    }

    /// Returns the rush-hour preset: doubled arrival rates with per-chargepoint queues.
    pub fn rush_hour() -> Self {
        Self {
            simulation: RunConfig {
                policy: ArrivalPolicyKind::PerChargepointQueue,
                ..RunConfig::default()
            },
            arrivals: ArrivalConfig {
                multiplier: 2.0,
                ..ArrivalConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "single", "mixed", "rush_hour"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPreset`] if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "single" => Ok(Self::single()),
            "mixed" => Ok(Self::mixed()),
            "rush_hour" => Ok(Self::rush_hour()),
            _ => Err(Error::UnknownPreset {
                name: name.to_string(),
                available: Self::PRESETS.join(", "),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid, names an unknown policy, or
    /// contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Produces the chargepoint-count sweep `1..=max`, each a copy of `self`
    /// with a single group of `power_kw` chargepoints.
    pub fn chargepoint_sweep(&self, power_kw: f64, max: usize) -> Vec<(usize, Self)> {
        (1..=max)
            .map(|count| {
                let cfg = Self {
                    chargepoints: vec![ChargepointType { power_kw, count }],
                    ..self.clone()
                };
                (count, cfg)
            })
            .collect()
    }

    /// Total number of chargepoints across all types.
    pub fn chargepoint_count(&self) -> usize {
        self.chargepoints.iter().map(|cp| cp.count).sum()
    }

    /// Sum of all chargepoint ratings (kW).
    pub fn theoretical_max_power_kw(&self) -> f64 {
        self.chargepoints
            .iter()
            .map(|cp| cp.power_kw * cp.count as f64)
            .sum()
    }

    /// Duration of one tick in hours.
    pub fn tick_hours(&self) -> f64 {
        self.simulation.granularity_ms as f64 / MS_PER_HOUR as f64
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let granularity = self.simulation.granularity_ms;
        if granularity < MIN_GRANULARITY_MS {
            errors.push(ConfigError::new(
                "simulation.granularity_ms",
                format!("must be >= {MIN_GRANULARITY_MS}, got {granularity}"),
            ));
        } else if MS_PER_HOUR % granularity != 0 {
            errors.push(ConfigError::new(
                "simulation.granularity_ms",
                format!("must divide one hour ({MS_PER_HOUR} ms), got {granularity}"),
            ));
        }

        if !(1..=9999).contains(&self.simulation.year) {
            errors.push(ConfigError::new(
                "simulation.year",
                format!("must be in [1, 9999], got {}", self.simulation.year),
            ));
        }

        for (i, cp) in self.chargepoints.iter().enumerate() {
            if !cp.power_kw.is_finite() || cp.power_kw < 0.0 {
                errors.push(ConfigError::new(
                    format!("chargepoints[{i}].power_kw"),
                    format!("must be a finite value >= 0, got {}", cp.power_kw),
                ));
            }
        }

        let arrivals = &self.arrivals;
        if arrivals.hourly.len() != HOURS_PER_DAY {
            errors.push(ConfigError::new(
                "arrivals.hourly",
                format!(
                    "must have exactly {HOURS_PER_DAY} entries, got {}",
                    arrivals.hourly.len()
                ),
            ));
        }
        for (hour, p) in arrivals.hourly.iter().enumerate() {
            if !(0.0..=1.0).contains(p) {
                errors.push(ConfigError::new(
                    format!("arrivals.hourly[{hour}]"),
                    format!("must be in [0.0, 1.0], got {p}"),
                ));
            }
        }
        if !MULTIPLIER_RANGE.contains(&arrivals.multiplier) {
            errors.push(ConfigError::new(
                "arrivals.multiplier",
                format!("must be in [0.2, 2.0], got {}", arrivals.multiplier),
            ));
        }

        let demand = &self.demand;
        if demand.distribution.is_empty() {
            errors.push(ConfigError::new(
                "demand.distribution",
                "must contain at least one entry",
            ));
        }
        for (i, &(km, p)) in demand.distribution.iter().enumerate() {
            if !km.is_finite() || km < 0.0 {
                errors.push(ConfigError::new(
                    format!("demand.distribution[{i}]"),
                    format!("distance must be a finite value >= 0, got {km}"),
                ));
            }
            if !(0.0..=1.0).contains(&p) {
                errors.push(ConfigError::new(
                    format!("demand.distribution[{i}]"),
                    format!("probability must be in [0.0, 1.0], got {p}"),
                ));
            }
        }
        let total: f64 = demand.distribution.iter().map(|&(_, p)| p).sum();
        if total > 1.0 + PROBABILITY_SUM_TOLERANCE {
            errors.push(ConfigError::new(
                "demand.distribution",
                format!("probabilities must sum to <= 1.0, got {total}"),
            ));
        }
        if !demand.consumption_kwh_per_100km.is_finite() || demand.consumption_kwh_per_100km < 0.0
        {
            errors.push(ConfigError::new(
                "demand.consumption_kwh_per_100km",
                format!(
                    "must be a finite value >= 0, got {}",
                    demand.consumption_kwh_per_100km
                ),
            ));
        }

        errors
    }

    /// Validates the configuration, turning any violation into [`Error::InvalidConfig`].
    ///
    /// # Errors
    ///
    /// Returns every violation found by [`SimulationConfig::validate`].
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(());
        }
        for e in &errors {
            warn!(field = %e.field, message = %e.message, "rejected configuration");
        }
        Err(Error::InvalidConfig(errors))
    }
}
