//! Error types for grid operations.

use thiserror::Error;

/// Errors reported by the grid algorithms and their bindings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NdImageError {
    /// The input is not a plain numeric or boolean array.
    #[error("Expected a numeric or boolean array, got {found}. For images use the image-level wrapper")]
    InvalidInputKind { found: String },

    /// Labeling found no foreground cells.
    #[error("No non-zero values: no connected components")]
    NoComponents,

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A flat buffer does not hold as many cells as its declared shape.
    #[error("Buffer of {actual} elements does not match shape {shape:?} ({expected} elements)")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, NdImageError>;
