//! Crate-wide error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by configuration loading, simulation setup and export.
///
/// The simulation loop itself cannot fail; everything here is detected
/// before a run starts or while writing its results.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more configuration fields violate their constraints.
    #[error("invalid configuration: {}", join_config_errors(.0))]
    InvalidConfig(Vec<ConfigError>),

    /// A scenario file could not be read.
    #[error("cannot read scenario \"{}\": {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A scenario file is not valid TOML or does not match the schema.
    #[error("invalid scenario TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// No preset with this name exists.
    #[error("unknown preset \"{name}\" (available: {available})")]
    UnknownPreset { name: String, available: String },

    /// An aggregation window is malformed (e.g. zero duration).
    #[error("invalid aggregation window: {0}")]
    InvalidWindow(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
