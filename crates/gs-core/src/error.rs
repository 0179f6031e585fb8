use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unrecognized parameter: {name}")]
    UnrecognizedParameter { name: String },

    #[error("invalid value {value} for parameter {name}")]
    InvalidParameterValue { name: String, value: f64 },

    #[error("unknown field: {field}")]
    UnknownField { field: String },

    #[error("target object is no longer alive")]
    DeadTarget,

    #[error("no conversion from {from} to {to}")]
    UnitMismatch { from: &'static str, to: &'static str },

    #[error("invariant violated: {what}")]
    Invariant { what: &'static str },
}
