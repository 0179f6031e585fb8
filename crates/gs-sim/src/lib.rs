//! Quasi-static simulation driver tying the solver kernel to the event
//! queue. Network file formats, component libraries, and any CLI remain
//! out of scope; the driver works against the [`gs_solver::NetworkModel`]
//! and [`gs_core::GridObject`] contracts.

pub mod error;
pub mod sim;

pub use error::{SimError, SimResult};
pub use sim::Simulation;
