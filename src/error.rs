use thiserror::Error;

/// Error types for the nllfit-rs library.
#[derive(Error, Debug)]
pub enum FitError {
    /// A parameter table row lacks a required selection or process column.
    #[error("Parameter '{parameter}' is missing applicability column '{column}'")]
    MissingColumn { parameter: String, column: String },

    /// The same parameter name appears more than once in a table.
    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    /// Error for invalid parameter definitions or values.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Malformed template histogram.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// A template or data histogram carries a negative variance.
    #[error("Negative variance in {location} at bin {bin}: {value}")]
    NegativeVariance {
        location: String,
        bin: usize,
        value: f64,
    },

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A selection/category pair that is not part of the template store.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// External data did not cover a category that is being fitted.
    #[error("Missing data for category: {0}")]
    MissingData(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// A numerical procedure produced a non-finite result.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Inconsistent fit configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for nllfit-rs operations.
pub type Result<T> = std::result::Result<T, FitError>;

impl From<String> for FitError {
    fn from(s: String) -> Self {
        FitError::Other(s)
    }
}

impl From<&str> for FitError {
    fn from(s: &str) -> Self {
        FitError::Other(s.to_string())
    }
}
