//! Integration tests for Jacobian assembly through decorator chains.

use gs_matrix::{FilterMatrix, MatrixData, SparseMatrix, SparseOrdering, TranslateMatrix};

#[test]
fn filter_then_translate_chain() {
    // A sub-component writes local rows 0..3 into the global matrix while
    // global row 11 is masked by a constraint.
    let mut global = SparseMatrix::new();
    let mut filt = FilterMatrix::new(&mut global);
    filt.add_filter([11]);
    let mut local = TranslateMatrix::new(&mut filt, 3);
    local.set_translation(0, 10);
    local.set_translation(1, 11);
    local.set_translation(2, 12);

    local.assign(0, 0, 1.0);
    local.assign(1, 0, 2.0); // lands on masked global row 11
    local.assign(2, 0, 3.0);
    local.assign(0, 0, 0.5); // accumulates with the first write

    assert_eq!(global.at(10, 0), 1.5);
    assert_eq!(global.at(11, 0), 0.0);
    assert_eq!(global.at(12, 0), 3.0);
}

#[test]
fn export_after_compact_is_row_sorted() {
    let mut m = SparseMatrix::new();
    m.assign(2, 0, 1.0);
    m.assign(0, 1, 2.0);
    m.assign(2, 0, 3.0);
    m.assign(1, 1, 4.0);
    m.compact();

    m.start();
    let mut last_row = 0;
    let mut total = 0.0;
    while let Some(e) = m.next_element() {
        assert!(e.row >= last_row, "rows must be non-decreasing for export");
        last_row = e.row;
        total += e.value;
    }
    assert_eq!(total, 10.0);
    assert_eq!(m.ordering(), SparseOrdering::RowMajor);
    assert_eq!(m.size(), 3);
}

#[test]
fn positional_access_matches_sequential() {
    let mut m = SparseMatrix::new();
    for i in 0..5 {
        m.assign(i, i, i as f64);
    }
    m.start();
    for i in 0..5 {
        let seq = m.next_element().unwrap();
        let pos = m.element(i);
        assert_eq!(seq, pos);
    }
}
