//! Growable triplet store, the main assembly target.

use crate::data::MatrixData;
use crate::element::{compare_col, compare_row, MatrixElement};

/// Which ordering, if any, the element list currently satisfies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SparseOrdering {
    None,
    RowMajor,
    ColMajor,
}

/// Ordered-insertion multiset of triplets.
///
/// `assign` pushes unconditionally; duplicates accumulate on lookup and can
/// be merged explicitly with [`compact`](MatrixData::compact). Growable: an
/// assignment is never dropped.
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    elements: Vec<MatrixElement>,
    ordering: SparseOrdering,
    compacted: bool,
    cursor: usize,
    row_lim: usize,
    col_lim: usize,
}

impl Default for SparseMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseMatrix {
    pub fn new() -> Self {
        Self::with_limits(usize::MAX, usize::MAX)
    }

    /// Create with row/column limits for checked assignment.
    pub fn with_limits(row_lim: usize, col_lim: usize) -> Self {
        Self {
            elements: Vec::new(),
            ordering: SparseOrdering::None,
            compacted: false,
            cursor: 0,
            row_lim,
            col_lim,
        }
    }

    /// Create with pre-sized storage for an expected nonzero count.
    pub fn with_capacity(max_non_zeros: usize) -> Self {
        let mut m = Self::new();
        m.elements.reserve(max_non_zeros);
        m
    }

    /// Sort elements into the requested ordering (stable, keeps duplicate
    /// insertion order).
    pub fn sort(&mut self, ordering: SparseOrdering) {
        match ordering {
            SparseOrdering::RowMajor => self.elements.sort_by(compare_row),
            SparseOrdering::ColMajor => self.elements.sort_by(compare_col),
            SparseOrdering::None => {}
        }
        self.ordering = ordering;
    }

    /// Current ordering state.
    pub fn ordering(&self) -> SparseOrdering {
        self.ordering
    }

    /// Whether duplicates have been merged since the last assignment.
    pub fn is_compact(&self) -> bool {
        self.compacted
    }

    /// Borrow the raw element list (sorted/compacted state as advertised).
    pub fn elements(&self) -> &[MatrixElement] {
        &self.elements
    }
}

impl MatrixData for SparseMatrix {
    fn clear(&mut self) {
        self.elements.clear();
        self.ordering = SparseOrdering::None;
        self.compacted = false;
        self.cursor = 0;
    }

    fn assign(&mut self, row: usize, col: usize, value: f64) {
        self.elements.push(MatrixElement::new(row, col, value));
        self.ordering = SparseOrdering::None;
        self.compacted = false;
    }

    fn size(&self) -> usize {
        self.elements.len()
    }

    fn capacity(&self) -> usize {
        self.elements.capacity()
    }

    fn reserve(&mut self, max_non_zeros: usize) {
        let len = self.elements.len();
        if max_non_zeros > len {
            self.elements.reserve(max_non_zeros - len);
        }
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.elements
            .iter()
            .filter(|e| e.row == row && e.col == col)
            .map(|e| e.value)
            .sum()
    }

    fn element(&self, index: usize) -> MatrixElement {
        self.elements[index]
    }

    fn compact(&mut self) {
        if self.compacted {
            return;
        }
        self.sort(SparseOrdering::RowMajor);
        self.elements.dedup_by(|next, kept| {
            if next.row == kept.row && next.col == kept.col {
                kept.value += next.value;
                true
            } else {
                false
            }
        });
        self.compacted = true;
    }

    fn row_limit(&self) -> usize {
        self.row_lim
    }

    fn col_limit(&self) -> usize {
        self.col_lim
    }

    fn set_row_limit(&mut self, limit: usize) {
        self.row_lim = limit;
    }

    fn set_col_limit(&mut self, limit: usize) {
        self.col_lim = limit;
    }

    fn start(&mut self) {
        self.cursor = 0;
    }

    fn next_element(&mut self) -> Option<MatrixElement> {
        let e = self.elements.get(self.cursor).copied();
        if e.is_some() {
            self.cursor += 1;
        }
        e
    }
}
