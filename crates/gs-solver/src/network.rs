//! The callback contract between the kernel and a network of components.

use gs_core::time::Time;
use gs_matrix::MatrixData;

use crate::error::SolverResult;
use crate::mode::SolverMode;

/// What a network must expose for a numerical backend to drive it.
///
/// The backend owns the state vectors and calls back for residual and
/// Jacobian evaluation; the network writes Jacobian entries exclusively
/// through [`MatrixData::assign`] and never reads the matrix back. The
/// `scaling_factor` (`cj`) weights derivative terms in DAE modes and is
/// zero for algebraic solves.
pub trait NetworkModel {
    /// Number of state variables in the given mode.
    fn state_size(&self, mode: &SolverMode) -> usize;

    /// Declared upper bound on Jacobian nonzeros in the given mode.
    fn jac_size(&self, mode: &SolverMode) -> usize;

    /// Load an initial guess into the state (and derivative) vectors.
    fn guess(&self, time: Time, state: &mut [f64], deriv: Option<&mut [f64]>, mode: &SolverMode);

    /// Evaluate residuals at the given time and state.
    fn residual(
        &mut self,
        time: Time,
        state: &[f64],
        deriv: Option<&[f64]>,
        resid: &mut [f64],
        mode: &SolverMode,
    ) -> SolverResult<()>;

    /// Accumulate Jacobian entries into `matrix`.
    fn jacobian(
        &mut self,
        time: Time,
        state: &[f64],
        deriv: Option<&[f64]>,
        matrix: &mut dyn MatrixData,
        scaling_factor: f64,
        mode: &SolverMode,
    ) -> SolverResult<()>;
}
