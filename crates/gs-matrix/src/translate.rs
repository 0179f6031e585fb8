//! Row-translation decorator.

use crate::data::MatrixData;
use crate::element::MatrixElement;

/// Wraps another matrix and remaps local row indices to parent rows.
///
/// A sub-component addresses its equations 0..N-1; the table maps each local
/// row into the parent's global row space. A local row without a translation
/// entry is a no-op assignment, so partially wired blocks stay safe.
pub struct TranslateMatrix<'a> {
    inner: &'a mut dyn MatrixData,
    table: Vec<Option<usize>>,
}

impl<'a> TranslateMatrix<'a> {
    /// Create with a fixed number of translatable local rows.
    pub fn new(inner: &'a mut dyn MatrixData, local_rows: usize) -> Self {
        Self {
            inner,
            table: vec![None; local_rows],
        }
    }

    /// Map a local row to a parent row. Out-of-table local rows are ignored.
    pub fn set_translation(&mut self, local_row: usize, parent_row: usize) {
        if let Some(slot) = self.table.get_mut(local_row) {
            *slot = Some(parent_row);
        }
    }

    fn translate(&self, local_row: usize) -> Option<usize> {
        self.table.get(local_row).copied().flatten()
    }
}

impl MatrixData for TranslateMatrix<'_> {
    fn clear(&mut self) {
        self.inner.clear();
    }

    fn assign(&mut self, row: usize, col: usize, value: f64) {
        if let Some(parent) = self.translate(row) {
            self.inner.assign(parent, col, value);
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
        match self.translate(row) {
            Some(parent) => self.inner.at(parent, col),
            None => 0.0,
        }
    }

    fn element(&self, index: usize) -> MatrixElement {
        self.inner.element(index)
    }

    fn compact(&mut self) {
        self.inner.compact();
    }

    fn row_limit(&self) -> usize {
        self.table.len()
    }

    fn col_limit(&self) -> usize {
        self.inner.col_limit()
    }

    fn set_row_limit(&mut self, limit: usize) {
        self.table.resize(limit, None);
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
