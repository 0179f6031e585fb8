//! Error types for solver operations.

use std::collections::TryReserveError;
use thiserror::Error;

pub type SolverResult<T> = Result<T, SolverError>;

/// Errors surfaced by the solver kernel.
///
/// Allocation failures are structural and propagate uncaught to the caller;
/// there is no safe smaller-size fallback for a state vector.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("allocation failed for {what}: {source}")]
    Allocation {
        what: &'static str,
        source: TryReserveError,
    },

    #[error("unrecognized parameter: {name}")]
    UnrecognizedParameter { name: String },

    #[error("invalid value {value} for parameter {name}")]
    InvalidParameterValue { name: String, value: f64 },

    #[error("convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("numeric error: {what}")]
    Numeric { what: String },

    #[error(transparent)]
    Core(#[from] gs_core::CoreError),

    #[error("capture i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("capture encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
