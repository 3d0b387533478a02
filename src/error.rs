//! Error types and result utilities for transform operations.

use thiserror::Error;

/// Convenience type alias for results that may contain a [`TransformError`].
pub type TransformResult<T> = Result<T, TransformError>;

/// Error types that can occur while fitting, applying or inverting transforms.
#[derive(Error, Debug)]
pub enum TransformError {
    /// `invert` was called on a transform (or composition) that cannot be inverted.
    #[error("Transform '{transform}' is not invertible")]
    NotInvertible {
        /// Name of the offending transform.
        transform: String,
    },

    /// Invalid configuration: unknown mode names, unsupported representation pairings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Normalization statistics were used before `scale_data` fitted them.
    #[error("Transform '{transform}' has no fitted statistics; call scale_data first")]
    NotFitted {
        /// Name of the transform whose statistics are missing.
        transform: &'static str,
    },

    /// The transform received a data kind it cannot consume.
    #[error("Transform '{transform}' expected {expected} data, got {actual}")]
    UnexpectedData {
        /// Name of the transform.
        transform: &'static str,
        /// Data kind the transform accepts.
        expected: &'static str,
        /// Data kind that was supplied.
        actual: &'static str,
    },

    /// Array dimensions don't match what the operation requires.
    #[error("Dimension mismatch error: {0}")]
    DimensionMismatch(String),

    /// Invalid parameters were supplied to an operation.
    #[error("Invalid parameter error: {0}")]
    InvalidParameter(String),

    /// An ndarray reshape or stacking operation failed.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// A child transform was requested at a position that does not exist.
    #[error("Transform index {index} out of range for composition of length {len}")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of children in the composition.
        len: usize,
    },

    /// The rayon thread pool could not be built.
    #[error("Parallel processing error: {0}")]
    Parallel(String),

    /// An item of a batch failed.
    #[error("Error processing item {index}: {source}")]
    BatchItem {
        /// Position of the item in the batch.
        index: usize,
        /// The underlying error.
        source: Box<TransformError>,
    },
}

impl TransformError {
    /// Create a not-invertible error for the named transform.
    pub fn not_invertible(transform: impl Into<String>) -> Self {
        Self::NotInvertible {
            transform: transform.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(message: impl Into<String>) -> Self {
        Self::DimensionMismatch(message.into())
    }

    /// Create an unexpected-data error.
    pub const fn unexpected_data(
        transform: &'static str,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self::UnexpectedData {
            transform,
            expected,
            actual,
        }
    }

    /// Create a parallel processing error.
    pub fn parallel_error(message: impl Into<String>) -> Self {
        Self::Parallel(message.into())
    }

    /// Wrap an error with the index of the batch item that produced it.
    pub fn batch_item(index: usize, source: TransformError) -> Self {
        Self::BatchItem {
            index,
            source: Box::new(source),
        }
    }

    /// Check if this error reports a non-invertible transform.
    pub const fn is_not_invertible(&self) -> bool {
        matches!(self, Self::NotInvertible { .. })
    }

    /// Check if this error reports an invalid configuration.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
