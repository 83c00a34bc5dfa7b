//! Error types for fitting and applying translation pipelines.

use thiserror::Error;

/// Error type shared by transforms, estimators, the translator and space storage.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// `fit` was called on a component that has already been fitted.
    #[error("{0} is already fitted")]
    AlreadyFitted(&'static str),

    /// `apply`/`reverse` was called before `fit`.
    #[error("{0} is not fitted")]
    NotFitted(&'static str),

    /// Source and target batches disagree on the number of samples.
    #[error("row count mismatch: source has {source_rows} rows, target has {target_rows}")]
    ShapeMismatch {
        source_rows: usize,
        target_rows: usize,
    },

    /// Source and target batches disagree on dimensionality where equal width is required.
    #[error("dimensionality mismatch: source has {source_dim} columns, target has {target_dim}")]
    DimensionMismatch { source_dim: usize, target_dim: usize },

    /// Input width differs from the width seen during fit.
    #[error("feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },

    /// Empty data provided where non-empty was required.
    #[error("empty data: {0}")]
    EmptyData(String),

    /// A decomposition failed to produce usable factors.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Unknown estimator or transform tag.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Invalid hyperparameter or constructor argument.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file operations.
    #[error("i/o error: {0}")]
    Io(String),

    /// A persisted artifact could not be found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TranslateError>;

impl From<std::io::Error> for TranslateError {
    fn from(err: std::io::Error) -> Self {
        TranslateError::Io(err.to_string())
    }
}

impl From<bincode::Error> for TranslateError {
    fn from(err: bincode::Error) -> Self {
        TranslateError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::Serialization(err.to_string())
    }
}
