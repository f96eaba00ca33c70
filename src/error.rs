//! Structured error types for the expression analysis pipeline.

use thiserror::Error;

/// Unified error type for all pipeline operations.
///
/// Every variant corresponds to a precondition failure detected before heavy
/// computation begins. Per-gene numerical degeneracies (e.g. zero variance
/// within a group) are handled locally by the tests and never surface here.
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// Malformed input: ragged rows, negative or non-finite counts, duplicate
    /// identifiers, or mismatched sample keys between matrix and groups.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A sample's total count is zero, making CPM normalization undefined.
    #[error("sample '{sample}' has a total count of zero; CPM is undefined")]
    DegenerateSample { sample: String },

    /// Fewer than two groups, or a group with fewer than two samples, making
    /// variance estimation undefined.
    #[error("degenerate group assignment: {0}")]
    DegenerateGroup(String),

    /// Requested principal component count exceeds the data's rank bound.
    #[error("requested {requested} components but the data supports at most {limit}")]
    InvalidDimension { requested: usize, limit: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExpressionError>;
