//! Fixed-shape dense block for tiny known-size Jacobians.

use crate::data::MatrixData;
use crate::element::MatrixElement;

/// Flat rows x cols accumulation block.
///
/// Used for small fixed Jacobian shapes (a two-port branch writes a known
/// handful of entries). Assignment is O(1) with no growth; an assignment
/// outside the shape is silently ignored. Growable storage is the
/// [`SparseMatrix`](crate::SparseMatrix).
#[derive(Clone, Debug)]
pub struct CompactMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
    cursor: usize,
}

impl CompactMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
            cursor: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

impl MatrixData for CompactMatrix {
    fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.cursor = 0;
    }

    fn assign(&mut self, row: usize, col: usize, value: f64) {
        if row < self.rows && col < self.cols {
            self.values[row * self.cols + col] += value;
        }
    }

    fn size(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.values.len()
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        if row < self.rows && col < self.cols {
            self.values[row * self.cols + col]
        } else {
            0.0
        }
    }

    fn element(&self, index: usize) -> MatrixElement {
        MatrixElement::new(index / self.cols, index % self.cols, self.values[index])
    }

    fn row_limit(&self) -> usize {
        self.rows
    }

    fn col_limit(&self) -> usize {
        self.cols
    }

    fn set_row_limit(&mut self, _limit: usize) {
        // shape is fixed at construction
    }

    fn set_col_limit(&mut self, _limit: usize) {
        // shape is fixed at construction
    }

    fn start(&mut self) {
        self.cursor = 0;
    }

    fn next_element(&mut self) -> Option<MatrixElement> {
        if self.cursor < self.values.len() {
            let e = self.element(self.cursor);
            self.cursor += 1;
            Some(e)
        } else {
            None
        }
    }
}
