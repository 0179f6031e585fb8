//! Error type for the simulation driver.

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Solver(#[from] gs_solver::SolverError),

    #[error(transparent)]
    Event(#[from] gs_events::EventError),

    #[error(transparent)]
    Core(#[from] gs_core::CoreError),

    #[error("simulation time error: {what}")]
    Time { what: String },
}
