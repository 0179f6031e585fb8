//! The triplet exchanged between components and matrix backends.

use core::cmp::Ordering;

/// One Jacobian contribution: a (row, column, value) triplet.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixElement {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl MatrixElement {
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// Row-major ordering (row, then column) used for CSR-style export.
pub fn compare_row(a: &MatrixElement, b: &MatrixElement) -> Ordering {
    a.row.cmp(&b.row).then(a.col.cmp(&b.col))
}

/// Column-major ordering (column, then row) used for CSC-style export.
pub fn compare_col(a: &MatrixElement, b: &MatrixElement) -> Ordering {
    a.col.cmp(&b.col).then(a.row.cmp(&b.row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orderings() {
        let a = MatrixElement::new(0, 5, 1.0);
        let b = MatrixElement::new(1, 0, 1.0);
        assert_eq!(compare_row(&a, &b), Ordering::Less);
        assert_eq!(compare_col(&a, &b), Ordering::Greater);
    }
}
