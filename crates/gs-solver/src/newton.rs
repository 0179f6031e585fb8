//! Dense Newton backend for algebraic solves.
//!
//! Drives a [`NetworkModel`] to a residual-norm fixed point: assemble the
//! Jacobian as triplets, translate to CSC, densify, and take a full LU step.
//! Small systems only; the translation layer is shared with iterative
//! backends so the assembly contract stays identical.

use nalgebra::DVector;
use tracing::{debug, warn};

use gs_core::time::Time;
use gs_matrix::{FilterMatrix, MatrixData, SparseMatrix};

use crate::capture::JacCapture;
use crate::error::{SolverError, SolverResult};
use crate::network::NetworkModel;
use crate::state::SolverState;
use crate::translate::{csc_to_dense, CscAssembly};

/// Iteration limits and convergence target for a Newton solve.
#[derive(Clone, Copy, Debug)]
pub struct NewtonConfig {
    pub max_iterations: usize,
    /// Convergence threshold on the residual 2-norm.
    pub tolerance: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-8,
        }
    }
}

/// Outcome of a converged solve.
#[derive(Clone, Copy, Debug)]
pub struct NewtonReport {
    pub iterations: usize,
    pub residual_norm: f64,
}

/// Dense direct Newton solver.
pub struct DenseNewton {
    config: NewtonConfig,
    /// Rows excluded from assembly and pinned to an identity diagonal.
    mask: Vec<usize>,
    assembly: Option<CscAssembly>,
    capture: Option<JacCapture>,
    jac_call_count: usize,
}

impl DenseNewton {
    pub fn new(config: NewtonConfig) -> Self {
        Self {
            config,
            mask: Vec::new(),
            assembly: None,
            capture: None,
            jac_call_count: 0,
        }
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Exclude the given rows from the Jacobian; their equations become
    /// `x[row] = const` via a unit diagonal. Rows outside the problem size
    /// are ignored during a solve.
    pub fn set_mask(&mut self, rows: Vec<usize>) {
        self.mask = rows;
        self.mask.sort_unstable();
        self.mask.dedup();
        self.reset_pattern();
    }

    pub fn clear_mask(&mut self) {
        if !self.mask.is_empty() {
            self.mask.clear();
            self.reset_pattern();
        }
    }

    /// Attach a capture sink; every Jacobian evaluation is recorded.
    pub fn set_capture(&mut self, capture: JacCapture) {
        self.capture = Some(capture);
    }

    pub fn take_capture(&mut self) -> Option<JacCapture> {
        self.capture.take()
    }

    /// Invalidate the cached sparsity pattern. Must be called after any
    /// change at Jacobian severity or above.
    pub fn reset_pattern(&mut self) {
        if let Some(asm) = self.assembly.as_mut() {
            asm.reset_pattern();
        }
    }

    pub fn jacobian_call_count(&self) -> usize {
        self.jac_call_count
    }

    fn evaluate_jacobian(
        &mut self,
        model: &mut dyn NetworkModel,
        time: Time,
        state: &[f64],
        sv: &SolverState,
        n: usize,
    ) -> SolverResult<SparseMatrix> {
        let mut jac = SparseMatrix::with_limits(n, n);
        if self.mask.is_empty() {
            model.jacobian(time, state, None, &mut jac, 0.0, sv.mode())?;
        } else {
            let mut filtered = FilterMatrix::new(&mut jac);
            filtered.add_filter(self.mask.iter().copied().filter(|&r| r < n));
            model.jacobian(time, state, None, &mut filtered, 0.0, sv.mode())?;
            for &row in &self.mask {
                if row < n {
                    jac.assign(row, row, 1.0);
                }
            }
        }
        self.jac_call_count += 1;
        if let Some(capture) = self.capture.as_mut() {
            capture.write(time, self.jac_call_count, sv.mode().offset_index, &mut jac)?;
        }
        Ok(jac)
    }

    /// Iterate to convergence at `time`, updating the state vector in place.
    pub fn solve(
        &mut self,
        model: &mut dyn NetworkModel,
        sv: &mut SolverState,
        time: Time,
    ) -> SolverResult<NewtonReport> {
        let n = sv.size();
        if !sv.is_allocated() || n == 0 {
            return Err(SolverError::Numeric {
                what: "solve called on unallocated state".to_string(),
            });
        }
        if self
            .assembly
            .as_ref()
            .map(|a| a.dim() != n)
            .unwrap_or(true)
        {
            self.assembly = Some(CscAssembly::new(n));
        }

        let mut resid = vec![0.0; n];
        for iteration in 0..self.config.max_iterations {
            {
                let state = sv.state_data().expect("allocated above");
                model.residual(time, state, None, &mut resid, sv.mode())?;
            }
            for &row in &self.mask {
                if row < n {
                    resid[row] = 0.0;
                }
            }
            let norm = resid.iter().map(|r| r * r).sum::<f64>().sqrt();
            debug!(iteration, norm, "newton step");
            if norm < self.config.tolerance {
                sv.set_initialized(true);
                return Ok(NewtonReport {
                    iterations: iteration,
                    residual_norm: norm,
                });
            }

            let mut jac = {
                let state = sv.state_data().expect("allocated above");
                self.evaluate_jacobian(model, time, state, sv, n)?
            };
            let dense = {
                let asm = self.assembly.as_mut().expect("created above");
                csc_to_dense(asm.assemble(&mut jac)?)
            };

            let rhs = DVector::from_column_slice(&resid);
            let dx = dense.lu().solve(&rhs).ok_or_else(|| {
                warn!(time, iteration, "singular jacobian");
                SolverError::Numeric {
                    what: format!("singular jacobian at time {time}"),
                }
            })?;

            let state = sv.state_data_mut().expect("allocated above");
            for (x, d) in state.iter_mut().zip(dx.iter()) {
                *x -= d;
            }
        }

        Err(SolverError::ConvergenceFailed {
            what: format!(
                "no convergence in {} iterations at time {time}",
                self.config.max_iterations
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::SolverMode;

    /// x0^2 - 4 = 0, x1 - x0 = 0. Roots at (2, 2) from a positive guess.
    struct Quadratic;

    impl NetworkModel for Quadratic {
        fn state_size(&self, _mode: &SolverMode) -> usize {
            2
        }

        fn jac_size(&self, _mode: &SolverMode) -> usize {
            3
        }

        fn guess(
            &self,
            _time: Time,
            state: &mut [f64],
            _deriv: Option<&mut [f64]>,
            _mode: &SolverMode,
        ) {
            state[0] = 1.0;
            state[1] = 0.0;
        }

        fn residual(
            &mut self,
            _time: Time,
            state: &[f64],
            _deriv: Option<&[f64]>,
            resid: &mut [f64],
            _mode: &SolverMode,
        ) -> SolverResult<()> {
            resid[0] = state[0] * state[0] - 4.0;
            resid[1] = state[1] - state[0];
            Ok(())
        }

        fn jacobian(
            &mut self,
            _time: Time,
            state: &[f64],
            _deriv: Option<&[f64]>,
            matrix: &mut dyn MatrixData,
            _scaling_factor: f64,
            _mode: &SolverMode,
        ) -> SolverResult<()> {
            matrix.assign(0, 0, 2.0 * state[0]);
            matrix.assign(1, 0, -1.0);
            matrix.assign(1, 1, 1.0);
            Ok(())
        }
    }

    fn solved_state() -> (DenseNewton, SolverState) {
        let mut sv = SolverState::new(SolverMode::algebraic());
        sv.allocate(2, 0).unwrap();
        let mut model = Quadratic;
        let mode = *sv.mode();
        model.guess(0.0, sv.state_data_mut().unwrap(), None, &mode);
        let mut newton = DenseNewton::new(NewtonConfig::default());
        newton.solve(&mut model, &mut sv, 0.0).unwrap();
        (newton, sv)
    }

    #[test]
    fn converges_to_root() {
        let (_, sv) = solved_state();
        let state = sv.state_data().unwrap();
        assert!((state[0] - 2.0).abs() < 1e-7);
        assert!((state[1] - 2.0).abs() < 1e-7);
        assert!(sv.is_initialized());
    }

    #[test]
    fn resolve_reuses_pattern() {
        let (mut newton, mut sv) = solved_state();
        let mut model = Quadratic;
        let report = newton.solve(&mut model, &mut sv, 1.0).unwrap();
        assert_eq!(report.iterations, 0, "already at the root");
        let rebuilds = newton.assembly.as_ref().unwrap().rebuild_count();
        assert_eq!(rebuilds, 1, "pattern established once, then reused");
    }

    #[test]
    fn masked_rows_hold_their_value() {
        let mut sv = SolverState::new(SolverMode::algebraic());
        sv.allocate(2, 0).unwrap();
        let mut model = Quadratic;
        let mode = *sv.mode();
        model.guess(0.0, sv.state_data_mut().unwrap(), None, &mode);
        sv.state_data_mut().unwrap()[1] = 9.0;

        let mut newton = DenseNewton::new(NewtonConfig::default());
        newton.set_mask(vec![1]);
        newton.solve(&mut model, &mut sv, 0.0).unwrap();
        let state = sv.state_data().unwrap();
        assert!((state[0] - 2.0).abs() < 1e-7);
        assert_eq!(state[1], 9.0, "masked state must not move");
    }

    #[test]
    fn mask_rows_outside_the_problem_are_ignored() {
        let mut sv = SolverState::new(SolverMode::algebraic());
        sv.allocate(2, 0).unwrap();
        let mut model = Quadratic;
        let mode = *sv.mode();
        model.guess(0.0, sv.state_data_mut().unwrap(), None, &mode);

        let mut newton = DenseNewton::new(NewtonConfig::default());
        newton.set_mask(vec![7]);
        newton.solve(&mut model, &mut sv, 0.0).unwrap();
        assert!((sv.state_data().unwrap()[0] - 2.0).abs() < 1e-7);
        assert!((sv.state_data().unwrap()[1] - 2.0).abs() < 1e-7);
    }

    #[test]
    fn unallocated_state_is_error() {
        let mut sv = SolverState::new(SolverMode::algebraic());
        let mut newton = DenseNewton::new(NewtonConfig::default());
        assert!(newton.solve(&mut Quadratic, &mut sv, 0.0).is_err());
    }

    #[test]
    fn singular_jacobian_is_error() {
        struct Flat;
        impl NetworkModel for Flat {
            fn state_size(&self, _mode: &SolverMode) -> usize {
                1
            }
            fn jac_size(&self, _mode: &SolverMode) -> usize {
                1
            }
            fn guess(
                &self,
                _time: Time,
                state: &mut [f64],
                _deriv: Option<&mut [f64]>,
                _mode: &SolverMode,
            ) {
                state[0] = 0.0;
            }
            fn residual(
                &mut self,
                _time: Time,
                _state: &[f64],
                _deriv: Option<&[f64]>,
                resid: &mut [f64],
                _mode: &SolverMode,
            ) -> SolverResult<()> {
                resid[0] = 1.0;
                Ok(())
            }
            fn jacobian(
                &mut self,
                _time: Time,
                _state: &[f64],
                _deriv: Option<&[f64]>,
                matrix: &mut dyn MatrixData,
                _scaling_factor: f64,
                _mode: &SolverMode,
            ) -> SolverResult<()> {
                matrix.assign(0, 0, 0.0);
                Ok(())
            }
        }
        let mut sv = SolverState::new(SolverMode::algebraic());
        sv.allocate(1, 0).unwrap();
        let mut newton = DenseNewton::new(NewtonConfig::default());
        assert!(matches!(
            newton.solve(&mut Flat, &mut sv, 0.0),
            Err(SolverError::Numeric { .. })
        ));
    }
}
