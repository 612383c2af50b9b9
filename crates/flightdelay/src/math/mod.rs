//! Small dense matrix type used for feature tables.
//!
//! `Array2` is a row-major container with just enough API for the feature
//! builder and the booster wrapper. It stays dependency-free so the core
//! types are easy to construct in tests.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
