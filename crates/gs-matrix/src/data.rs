//! The uniform Jacobian-entry contract.

use crate::element::MatrixElement;

/// Contract for accumulating Jacobian contributions.
///
/// Implementations are not thread safe; one assembly pass owns the matrix.
/// Random access through [`at`](MatrixData::at) may be slow for sparse
/// backends; the sequential protocol ([`start`](MatrixData::start) /
/// [`next_element`](MatrixData::next_element)) is the intended one-pass
/// export path to a backend format.
pub trait MatrixData {
    /// Remove all stored elements.
    fn clear(&mut self);

    /// Add a contribution at (row, col).
    ///
    /// MUST accumulate with any existing contribution at the same position,
    /// never overwrite it. Growable backends must never silently drop an
    /// assignment; bounded backends drop assignments outside their shape.
    fn assign(&mut self, row: usize, col: usize, value: f64);

    /// Number of stored elements (duplicates counted until compaction).
    fn size(&self) -> usize;

    /// Number of elements storable without growth.
    fn capacity(&self) -> usize;

    /// Pre-size storage for an expected number of nonzeros.
    fn reserve(&mut self, _max_non_zeros: usize) {}

    /// Sum of all contributions at (row, col); 0.0 when absent.
    fn at(&self, row: usize, col: usize) -> f64;

    /// Element at position `index` in storage order.
    fn element(&self, index: usize) -> MatrixElement;

    /// Merge duplicate positions, preserving summed values. Backends that
    /// are already duplicate-free may leave this a no-op.
    fn compact(&mut self) {}

    /// Maximum valid row index + 1 (used by checked assigns and filters).
    fn row_limit(&self) -> usize;
    /// Maximum valid column index + 1.
    fn col_limit(&self) -> usize;
    fn set_row_limit(&mut self, limit: usize);
    fn set_col_limit(&mut self, limit: usize);

    /// Begin a sequential retrieval pass.
    fn start(&mut self);

    /// Next element of the pass, or `None` when exhausted.
    fn next_element(&mut self) -> Option<MatrixElement>;

    /// Assign only if the row is inside the row limit.
    fn assign_check_row(&mut self, row: usize, col: usize, value: f64) {
        if row < self.row_limit() {
            self.assign(row, col, value);
        }
    }

    /// Assign only if the column is inside the column limit.
    fn assign_check_col(&mut self, row: usize, col: usize, value: f64) {
        if col < self.col_limit() {
            self.assign(row, col, value);
        }
    }

    /// Assign only if both indices are inside the limits.
    fn assign_check(&mut self, row: usize, col: usize, value: f64) {
        if row < self.row_limit() && col < self.col_limit() {
            self.assign(row, col, value);
        }
    }

    /// Accumulate every element of `other` into this matrix.
    fn merge(&mut self, other: &mut dyn MatrixData) {
        other.start();
        while let Some(e) = other.next_element() {
            self.assign(e.row, e.col, e.value);
        }
    }

    /// Accumulate every element of `other`, scaled.
    fn merge_scaled(&mut self, other: &mut dyn MatrixData, scale: f64) {
        other.start();
        while let Some(e) = other.next_element() {
            self.assign(e.row, e.col, e.value * scale);
        }
    }

    /// Copy the elements of one row of `other` into a different row here.
    fn copy_translate_row(&mut self, other: &mut dyn MatrixData, orig_row: usize, new_row: usize) {
        other.start();
        while let Some(e) = other.next_element() {
            if e.row == orig_row {
                self.assign(new_row, e.col, e.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseMatrix;

    #[test]
    fn merge_accumulates() {
        let mut a = SparseMatrix::new();
        let mut b = SparseMatrix::new();
        a.assign(0, 0, 1.0);
        b.assign(0, 0, 2.0);
        b.assign(1, 1, 3.0);
        a.merge(&mut b);
        assert_eq!(a.at(0, 0), 3.0);
        assert_eq!(a.at(1, 1), 3.0);
    }

    #[test]
    fn merge_scaled_and_translate() {
        let mut a = SparseMatrix::new();
        let mut b = SparseMatrix::new();
        b.assign(2, 1, 4.0);
        a.merge_scaled(&mut b, 0.5);
        assert_eq!(a.at(2, 1), 2.0);

        let mut c = SparseMatrix::new();
        c.copy_translate_row(&mut b, 2, 7);
        assert_eq!(c.at(7, 1), 4.0);
        assert_eq!(c.at(2, 1), 0.0);
    }

    #[test]
    fn checked_assign_respects_limits() {
        let mut a = SparseMatrix::with_limits(2, 2);
        a.assign_check(5, 0, 1.0);
        a.assign_check(0, 5, 1.0);
        a.assign_check(1, 1, 1.0);
        assert_eq!(a.size(), 1);
        assert_eq!(a.at(1, 1), 1.0);
    }
}
