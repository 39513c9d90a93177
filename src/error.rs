use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("Volume must have non-zero dimensions, got {0:?}")]
    EmptyVolume((usize, usize, usize)),
}

/// A single `x,y,z` record that could not be parsed.
#[derive(Debug, Error, PartialEq)]
pub enum PointParseError {
    #[error("line {line}: expected 3 comma-separated values, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid coordinate {value:?}")]
    InvalidNumber { line: usize, value: String },
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("No plan loaded: a plan needs a start and an end point, found {found}")]
    InsufficientPlanData { found: usize },

    #[error("No plan loaded: {0}")]
    Malformed(#[from] PointParseError),

    #[error("IO error reading plan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid zoom limits: min {min} must be positive and below max {max}")]
    ZoomLimits { min: f32, max: f32 },

    #[error("Invalid zoom step {0}: must be positive")]
    ZoomStep(f32),

    #[error("Invalid dash pattern: dash {dash} must be positive and gap {gap} not negative")]
    DashPattern { dash: f32, gap: f32 },

    #[error("Invalid reference size {0}: must be positive")]
    ReferenceSize(f32),
}
