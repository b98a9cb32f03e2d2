//! Error types for ROC analysis and calibration

use thiserror::Error;

/// Result type alias for ROC and calibration operations
pub type Result<T> = std::result::Result<T, RocError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum RocError {
    /// Mismatched lengths, empty input, non-binary labels, or a single-class
    /// dataset where both classes are required.
    #[error("Input error: {0}")]
    InputError(String),

    /// A well-formed argument outside the domain of the operation,
    /// e.g. a partial AUC window with `op1 >= op2`.
    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl RocError {
    /// Shorthand for [`RocError::InvalidParameter`]
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: &str,
    ) -> Self {
        RocError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for RocError {
    fn from(err: serde_json::Error) -> Self {
        RocError::SerializationError(err.to_string())
    }
}
