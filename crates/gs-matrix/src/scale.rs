//! Value-scaling decorator.

use crate::data::MatrixData;
use crate::element::MatrixElement;

/// Wraps another matrix and multiplies every assigned value by a fixed
/// scalar, a unit-conversion pass-through.
pub struct ScaleMatrix<'a> {
    inner: &'a mut dyn MatrixData,
    factor: f64,
}

impl<'a> ScaleMatrix<'a> {
    pub fn new(inner: &'a mut dyn MatrixData, factor: f64) -> Self {
        Self { inner, factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl MatrixData for ScaleMatrix<'_> {
    fn clear(&mut self) {
        self.inner.clear();
    }

    fn assign(&mut self, row: usize, col: usize, value: f64) {
        self.inner.assign(row, col, value * self.factor);
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn reserve(&mut self, max_non_zeros: usize) {
        self.inner.reserve(max_non_zeros);
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.inner.at(row, col)
    }

    fn element(&self, index: usize) -> MatrixElement {
        self.inner.element(index)
    }

    fn compact(&mut self) {
        self.inner.compact();
    }

    fn row_limit(&self) -> usize {
        self.inner.row_limit()
    }

    fn col_limit(&self) -> usize {
        self.inner.col_limit()
    }

    fn set_row_limit(&mut self, limit: usize) {
        self.inner.set_row_limit(limit);
    }

    fn set_col_limit(&mut self, limit: usize) {
        self.inner.set_col_limit(limit);
    }

    fn start(&mut self) {
        self.inner.start();
    }

    fn next_element(&mut self) -> Option<MatrixElement> {
        self.inner.next_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterMatrix;
    use crate::sparse::SparseMatrix;

    #[test]
    fn values_scaled() {
        let mut store = SparseMatrix::new();
        let mut sc = ScaleMatrix::new(&mut store, 2.0);
        sc.assign(0, 0, 3.0);
        sc.assign(0, 0, 1.0);
        assert_eq!(store.at(0, 0), 8.0);
    }

    #[test]
    fn decorator_chain_scale_then_filter() {
        // scale -> filter -> store, the shape solver adapters build
        let mut store = SparseMatrix::new();
        let mut filt = FilterMatrix::new(&mut store);
        filt.add_filter([1]);
        let mut sc = ScaleMatrix::new(&mut filt, 10.0);
        sc.assign(0, 0, 1.0);
        sc.assign(1, 1, 1.0);
        assert_eq!(store.at(0, 0), 10.0);
        assert_eq!(store.at(1, 1), 0.0);
    }
}
