//! Error types for event construction, parsing, and queue configuration.

use thiserror::Error;

pub type EventResult<T> = Result<T, EventError>;

/// Errors from the event layer.
///
/// Execution failures of an armed event are NOT errors; they fold into the
/// change-code result so a bad setpoint never tears down the simulation.
/// These errors cover construction and configuration, which fail loudly.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("event string parse error: {what}")]
    Parse { what: String },

    #[error("unknown object: {name}")]
    UnknownObject { name: String },

    #[error("unrecognized parameter: {name}")]
    UnrecognizedParameter { name: String },

    #[error("invalid value {value} for parameter {name}")]
    InvalidParameterValue { name: String, value: f64 },

    #[error("time series load error: {what}")]
    SeriesLoad { what: String },

    #[error(transparent)]
    Core(#[from] gs_core::CoreError),

    #[error("series file i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("series file format error: {0}")]
    Csv(#[from] csv::Error),
}
