//! Row-masking decorator.

use crate::data::MatrixData;
use crate::element::MatrixElement;

/// Wraps another matrix and drops assignments to an excluded row set.
///
/// Used when the physical equation for a row is temporarily replaced by a
/// constraint (a disabled breaker, a masked algebraic state): component
/// models keep writing their full Jacobian and the mask eats the rows whose
/// equations are not live. The excluded set is kept sorted for binary search.
pub struct FilterMatrix<'a> {
    inner: &'a mut dyn MatrixData,
    excluded: Vec<usize>,
}

impl<'a> FilterMatrix<'a> {
    pub fn new(inner: &'a mut dyn MatrixData) -> Self {
        Self {
            inner,
            excluded: Vec::new(),
        }
    }

    /// Add rows to the excluded set.
    pub fn add_filter(&mut self, rows: impl IntoIterator<Item = usize>) {
        self.excluded.extend(rows);
        self.excluded.sort_unstable();
        self.excluded.dedup();
    }

    /// Whether a row is masked.
    pub fn is_filtered(&self, row: usize) -> bool {
        self.excluded.binary_search(&row).is_ok()
    }
}

impl MatrixData for FilterMatrix<'_> {
    fn clear(&mut self) {
        self.inner.clear();
    }

    fn assign(&mut self, row: usize, col: usize, value: f64) {
        if !self.is_filtered(row) {
            self.inner.assign(row, col, value);
        }
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
