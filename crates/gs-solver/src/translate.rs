//! Translation pass: assembled triplets to backend storage layouts.
//!
//! A backend wants compressed-column (or dense column-major) storage, while
//! assembly produces an unordered triplet multiset. The slow path sorts,
//! merges, and rebuilds the compressed structure from scratch; once a
//! pattern is established, the fast path only rewrites the value array.
//! That is valid exactly as long as the sparsity pattern of the new assembly
//! matches the previous one; any pattern change falls back to the rebuild.

use nalgebra::DMatrix;
use nalgebra_sparse::{coo::CooMatrix, csc::CscMatrix};
use tracing::debug;

use gs_matrix::{MatrixData, MatrixElement, SparseMatrix, SparseOrdering};

use crate::error::{SolverError, SolverResult};

/// Reusable triplet-to-CSC translator for one matrix dimension.
pub struct CscAssembly {
    dim: usize,
    matrix: Option<CscMatrix<f64>>,
    rebuild_count: usize,
}

impl CscAssembly {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            matrix: None,
            rebuild_count: 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of full structural rebuilds performed so far.
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    /// Last translated matrix, if any.
    pub fn matrix(&self) -> Option<&CscMatrix<f64>> {
        self.matrix.as_ref()
    }

    /// Drop the established pattern, forcing the next call onto the slow
    /// path. Called after any change code at Jacobian severity or above.
    pub fn reset_pattern(&mut self) {
        self.matrix = None;
    }

    /// Translate `source` into CSC form, reusing the previous pattern when
    /// it still matches.
    pub fn assemble(&mut self, source: &mut SparseMatrix) -> SolverResult<&CscMatrix<f64>> {
        // merge duplicates, then order column-major for the compressed scan
        source.compact();
        source.sort(SparseOrdering::ColMajor);

        if let Some(csc) = self.matrix.as_mut() {
            if refill_values(csc, source.elements()) {
                return Ok(self.matrix.as_ref().expect("pattern just refilled"));
            }
            debug!(nnz = source.size(), "jacobian pattern changed, rebuilding");
        }

        let mut coo = CooMatrix::new(self.dim, self.dim);
        for e in source.elements() {
            if e.row >= self.dim || e.col >= self.dim {
                return Err(SolverError::Numeric {
                    what: format!(
                        "triplet ({}, {}) outside {}x{} jacobian",
                        e.row, e.col, self.dim, self.dim
                    ),
                });
            }
            coo.push(e.row, e.col, e.value);
        }
        self.matrix = Some(CscMatrix::from(&coo));
        self.rebuild_count += 1;
        Ok(self.matrix.as_ref().expect("pattern just rebuilt"))
    }
}

/// Overwrite the CSC value array from column-major-sorted, compacted
/// elements. Returns false (leaving values untouched where possible) if the
/// structure does not match.
fn refill_values(csc: &mut CscMatrix<f64>, elements: &[MatrixElement]) -> bool {
    if csc.nnz() != elements.len() {
        return false;
    }
    {
        let (offsets, rows, _) = csc.csc_data();
        let mut k = 0;
        for col in 0..offsets.len() - 1 {
            for idx in offsets[col]..offsets[col + 1] {
                let e = &elements[k];
                if e.col != col || e.row != rows[idx] {
                    return false;
                }
                k += 1;
            }
        }
    }
    let (_, _, values) = csc.csc_data_mut();
    for (v, e) in values.iter_mut().zip(elements) {
        *v = e.value;
    }
    true
}

/// Densify a translated CSC matrix (small systems / dense backends).
pub fn csc_to_dense(csc: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(csc.nrows(), csc.ncols());
    for (row, col, value) in csc.triplet_iter() {
        dense[(row, col)] += value;
    }
    dense
}

/// One-pass export of any triplet source into a dense matrix.
/// Out-of-shape entries are skipped.
pub fn to_dense(source: &mut dyn MatrixData, rows: usize, cols: usize) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(rows, cols);
    source.start();
    while let Some(e) = source.next_element() {
        if e.row < rows && e.col < cols {
            dense[(e.row, e.col)] += e.value;
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: [f64; 3]) -> SparseMatrix {
        let mut m = SparseMatrix::new();
        m.assign(0, 0, values[0]);
        m.assign(1, 1, values[1]);
        m.assign(0, 1, values[2]);
        m
    }

    #[test]
    fn slow_path_sums_duplicates() {
        let mut asm = CscAssembly::new(2);
        let mut m = sample([1.0, 2.0, 3.0]);
        m.assign(0, 0, 0.5);
        let csc = asm.assemble(&mut m).unwrap();
        assert_eq!(csc.nnz(), 3);
        assert_eq!(csc.get_entry(0, 0).unwrap().into_value(), 1.5);
        assert_eq!(asm.rebuild_count(), 1);
    }

    #[test]
    fn fast_path_reuses_pattern() {
        let mut asm = CscAssembly::new(2);
        asm.assemble(&mut sample([1.0, 2.0, 3.0])).unwrap();
        let csc = asm.assemble(&mut sample([4.0, 5.0, 6.0])).unwrap();
        assert_eq!(csc.get_entry(0, 0).unwrap().into_value(), 4.0);
        assert_eq!(csc.get_entry(1, 1).unwrap().into_value(), 5.0);
        assert_eq!(asm.rebuild_count(), 1, "second assemble must not rebuild");
    }

    #[test]
    fn pattern_change_forces_rebuild() {
        let mut asm = CscAssembly::new(3);
        asm.assemble(&mut sample([1.0, 2.0, 3.0])).unwrap();
        let mut grown = sample([1.0, 2.0, 3.0]);
        grown.assign(2, 2, 9.0);
        let csc = asm.assemble(&mut grown).unwrap();
        assert_eq!(csc.nnz(), 4);
        assert_eq!(asm.rebuild_count(), 2);
    }

    #[test]
    fn reset_pattern_rebuilds() {
        let mut asm = CscAssembly::new(2);
        asm.assemble(&mut sample([1.0, 2.0, 3.0])).unwrap();
        asm.reset_pattern();
        asm.assemble(&mut sample([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(asm.rebuild_count(), 2);
    }

    #[test]
    fn out_of_range_triplet_is_error() {
        let mut asm = CscAssembly::new(1);
        let mut m = SparseMatrix::new();
        m.assign(5, 0, 1.0);
        assert!(matches!(
            asm.assemble(&mut m),
            Err(SolverError::Numeric { .. })
        ));
    }

    #[test]
    fn densify() {
        let mut m = sample([1.0, 2.0, 3.0]);
        let dense = to_dense(&mut m, 2, 2);
        assert_eq!(dense[(0, 0)], 1.0);
        assert_eq!(dense[(1, 1)], 2.0);
        assert_eq!(dense[(0, 1)], 3.0);
        assert_eq!(dense[(1, 0)], 0.0);

        let mut asm = CscAssembly::new(2);
        let csc = asm.assemble(&mut m).unwrap();
        assert_eq!(csc_to_dense(csc), dense);
    }
}
