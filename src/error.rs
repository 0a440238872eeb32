//! Error types for the flatprice pipeline

use thiserror::Error;

/// Result type alias for flatprice operations
pub type Result<T> = std::result::Result<T, FlatpriceError>;

/// Main error type for the flatprice pipeline.
///
/// Every stage aborts on the first error; nothing is retried because the
/// pipeline is deterministic for a fixed input and seed.
#[derive(Error, Debug)]
pub enum FlatpriceError {
    /// A required column is missing or cannot be read as its declared type
    #[error("Schema error: {0}")]
    Schema(String),

    /// Cleaning or partitioning left nothing usable to work with
    #[error("Data quality error: {0}")]
    DataQuality(String),

    /// Degenerate design matrix during scaling or fitting
    #[error("Fit error: {0}")]
    Fit(String),

    /// Metrics are undefined for the given targets
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Model not fitted")]
    NotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },
}

impl FlatpriceError {
    pub(crate) fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        FlatpriceError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for FlatpriceError {
    fn from(err: polars::error::PolarsError) -> Self {
        FlatpriceError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for FlatpriceError {
    fn from(err: serde_json::Error) -> Self {
        FlatpriceError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FlatpriceError {
    fn from(err: ndarray::ShapeError) -> Self {
        FlatpriceError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlatpriceError::Schema("missing column 'price'".to_string());
        assert_eq!(err.to_string(), "Schema error: missing column 'price'");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FlatpriceError = io_err.into();
        assert!(matches!(err, FlatpriceError::Io(_)));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = FlatpriceError::invalid_parameter("seed", 7, "must be positive");
        assert_eq!(err.to_string(), "Invalid parameter: seed = 7, must be positive");
    }
}
