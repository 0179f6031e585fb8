//! The solver state container.
//!
//! Owns the flat vectors a numerical backend works on. All vectors are
//! resized together and atomically when the declared problem size changes:
//! stale vectors are destroyed before their replacements are created, never
//! resized in place, so a caller can never observe a half-reallocated
//! container. Pointers into the vectors are invalidated by any reallocation;
//! components must not hold them across an `allocate` call.

use crate::error::{SolverError, SolverResult};
use crate::mode::SolverMode;

const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Fallibly allocate a vector filled with `fill`.
///
/// Allocation failure is fatal to the surrounding operation and propagates
/// immediately, keeping the container consistent.
fn alloc_vec(len: usize, fill: f64, what: &'static str) -> SolverResult<Vec<f64>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|source| SolverError::Allocation { what, source })?;
    v.resize(len, fill);
    Ok(v)
}

/// State vectors and sizing for one active solver mode.
pub struct SolverState {
    mode: SolverMode,
    size: usize,
    root_count: usize,
    max_nnz: usize,
    tolerance: f64,
    state: Option<Vec<f64>>,
    deriv: Option<Vec<f64>>,
    tols: Option<Vec<f64>>,
    type_data: Option<Vec<f64>>,
    allocated: bool,
    initialized: bool,
}

impl SolverState {
    /// Create an unallocated container for the given mode.
    pub fn new(mode: SolverMode) -> Self {
        Self {
            mode,
            size: 0,
            root_count: 0,
            max_nnz: 0,
            tolerance: DEFAULT_TOLERANCE,
            state: None,
            deriv: None,
            tols: None,
            type_data: None,
            allocated: false,
            initialized: false,
        }
    }

    /// (Re)allocate all vectors for `state_count` states.
    ///
    /// A call with the already-allocated size is a cheap no-op (only the
    /// root count is refreshed); otherwise every vector is destroyed and
    /// recreated and the initialized flag resets. The derivative vector
    /// exists only for differential modes, the constraint/type vector only
    /// for DAE modes.
    pub fn allocate(&mut self, state_count: usize, root_count: usize) -> SolverResult<()> {
        if self.allocated && state_count == self.size {
            self.root_count = root_count;
            return Ok(());
        }

        self.initialized = false;
        self.allocated = false;

        // destroy stale vectors before creating replacements
        self.state = None;
        self.deriv = None;
        self.tols = None;
        self.type_data = None;

        self.state = Some(alloc_vec(state_count, 0.0, "state vector")?);
        if self.mode.has_differential() {
            self.deriv = Some(alloc_vec(state_count, 0.0, "derivative vector")?);
        }
        self.tols = Some(alloc_vec(state_count, self.tolerance, "tolerance vector")?);
        if self.mode.is_dae() {
            self.type_data = Some(alloc_vec(state_count, 1.0, "type vector")?);
        }

        self.size = state_count;
        self.root_count = root_count;
        self.allocated = true;
        Ok(())
    }

    /// Record the declared Jacobian nonzero budget. Does not allocate.
    pub fn set_max_non_zeros(&mut self, non_zero_count: usize) {
        self.max_nnz = non_zero_count;
    }

    pub fn max_non_zeros(&self) -> usize {
        self.max_nnz
    }

    pub fn mode(&self) -> &SolverMode {
        &self.mode
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn root_count(&self) -> usize {
        self.root_count
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Mark the container initialized (backend finished its first setup).
    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// State vector, `None` until allocated.
    pub fn state_data(&self) -> Option<&[f64]> {
        self.state.as_deref()
    }

    pub fn state_data_mut(&mut self) -> Option<&mut [f64]> {
        self.state.as_deref_mut()
    }

    /// Derivative vector; `None` for purely algebraic modes.
    pub fn deriv_data(&self) -> Option<&[f64]> {
        self.deriv.as_deref()
    }

    pub fn deriv_data_mut(&mut self) -> Option<&mut [f64]> {
        self.deriv.as_deref_mut()
    }

    /// Tolerance vector, `None` until allocated.
    pub fn tol_data(&self) -> Option<&[f64]> {
        self.tols.as_deref()
    }

    pub fn tol_data_mut(&mut self) -> Option<&mut [f64]> {
        self.tols.as_deref_mut()
    }

    /// Constraint/type vector; `None` unless the mode is DAE.
    pub fn type_data(&self) -> Option<&[f64]> {
        self.type_data.as_deref()
    }

    pub fn type_data_mut(&mut self) -> Option<&mut [f64]> {
        self.type_data.as_deref_mut()
    }

    /// Copy configuration into `target`; copy vector contents only when
    /// `full_copy` is requested and this container is allocated.
    pub fn clone_to(&self, target: &mut SolverState, full_copy: bool) -> SolverResult<()> {
        if target.mode != self.mode {
            // which vectors exist depends on the mode; a same-size
            // allocation from the old mode must not survive
            target.allocated = false;
        }
        target.mode = self.mode;
        target.tolerance = self.tolerance;
        target.max_nnz = self.max_nnz;
        if full_copy && self.allocated {
            target.allocate(self.size, self.root_count)?;
            let copy_into = |dst: Option<&mut Vec<f64>>, src: Option<&Vec<f64>>| {
                if let (Some(dst), Some(src)) = (dst, src) {
                    dst.copy_from_slice(src);
                }
            };
            copy_into(target.state.as_mut(), self.state.as_ref());
            copy_into(target.deriv.as_mut(), self.deriv.as_ref());
            copy_into(target.tols.as_mut(), self.tols.as_ref());
            copy_into(target.type_data.as_mut(), self.type_data.as_ref());
        }
        Ok(())
    }

    /// String-parameter configuration entry point.
    pub fn set(&mut self, param: &str, value: f64) -> SolverResult<()> {
        match param {
            "tolerance" => {
                if value > 0.0 {
                    self.tolerance = value;
                    Ok(())
                } else {
                    Err(SolverError::InvalidParameterValue {
                        name: param.to_string(),
                        value,
                    })
                }
            }
            "maxnnz" => {
                if value >= 0.0 {
                    self.max_nnz = value as usize;
                    Ok(())
                } else {
                    Err(SolverError::InvalidParameterValue {
                        name: param.to_string(),
                        value,
                    })
                }
            }
            _ => Err(SolverError::UnrecognizedParameter {
                name: param.to_string(),
            }),
        }
    }

    pub fn get(&self, param: &str) -> Option<f64> {
        match param {
            "tolerance" => Some(self.tolerance),
            "maxnnz" => Some(self.max_nnz as f64),
            "statesize" => Some(self.size as f64),
            _ => None,
        }
    }
}
