//! Solver-side kernel: state container, Jacobian translation, backends.
//!
//! This crate owns the boundary between the network's component models and
//! a numerical backend:
//! - [`SolverState`] holds the flat state/derivative/tolerance vectors and
//!   the declared Jacobian nonzero budget for whichever solver mode is
//!   active, reallocating them atomically when the problem size changes.
//! - [`NetworkModel`] is the narrow callback contract a network must
//!   satisfy (residual + Jacobian through the triplet interface).
//! - [`CscAssembly`] performs the one-time translation pass from assembled
//!   triplets into compressed-column storage, with a value-refill fast path
//!   when the sparsity pattern is unchanged.
//! - [`DenseNewton`] is a simple algebraic backend exercising the whole
//!   contract; integration-algorithm internals of production backends are
//!   deliberately unspecified here.

pub mod capture;
pub mod error;
pub mod mode;
pub mod network;
pub mod newton;
pub mod state;
pub mod translate;

pub use capture::{CaptureRecord, JacCapture};
pub use error::{SolverError, SolverResult};
pub use mode::{ModeKind, SolverMode};
pub use network::NetworkModel;
pub use newton::{DenseNewton, NewtonConfig, NewtonReport};
pub use state::SolverState;
pub use translate::{csc_to_dense, to_dense, CscAssembly};
