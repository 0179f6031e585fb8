//! Sparse-triplet matrix interface for Jacobian assembly.
//!
//! Component models report partial derivatives through one uniform contract,
//! [`MatrixData`], without knowing which concrete storage is behind it. The
//! fundamental invariant is that `assign` accumulates: two couplings writing
//! to the same (row, col) produce the sum of their contributions, because
//! partial derivatives from independent physical paths are additive.
//!
//! Provided here:
//! - [`SparseMatrix`]: growable triplet store, the workhorse for assembly
//! - [`CompactMatrix`]: fixed-shape flat block for tiny known-size Jacobians
//! - decorators that filter, translate, or scale assignments on the way
//!   through to a wrapped matrix

pub mod compact;
pub mod data;
pub mod element;
pub mod filter;
pub mod scale;
pub mod sparse;
pub mod translate;

pub use compact::CompactMatrix;
pub use data::MatrixData;
pub use element::{compare_col, compare_row, MatrixElement};
pub use filter::FilterMatrix;
pub use scale::ScaleMatrix;
pub use sparse::{SparseMatrix, SparseOrdering};
pub use translate::TranslateMatrix;
