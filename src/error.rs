use thiserror::Error;

/// Error types for the odrfit library.
#[derive(Error, Debug)]
pub enum FitError {
    /// Error for invalid or missing initial parameter values.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Error indicating a mismatch in array lengths.
    #[error("Length mismatch: {0}")]
    DimensionMismatch(String),

    /// Mutually exclusive or otherwise malformed caller arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid state of a result or data structure.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error during model evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// No resampled fit could be aggregated.
    #[error("Aggregation failed: {0}")]
    AggregationFailure(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FitError {
    /// Short label for the error category, used in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            FitError::InvalidParameter(_)
            | FitError::DimensionMismatch(_)
            | FitError::InvalidArguments(_)
            | FitError::InvalidInput(_) => "invalid value",
            _ => "unexpected error",
        }
    }
}

/// Result type alias for odrfit operations.
pub type Result<T> = std::result::Result<T, FitError>;

/// Logging policy applied at the boundary of public operations.
///
/// Critical operations log the failure and hand it back to the caller;
/// recoverable ones log it and continue without a value.
pub(crate) trait LogOnError<T> {
    /// Log the error at error level and propagate it unchanged.
    fn log_critical(self, operation: &str) -> Result<T>;

    /// Log the error at warn level and discard it.
    fn log_recoverable(self, operation: &str) -> Option<T>;
}

impl<T> LogOnError<T> for Result<T> {
    fn log_critical(self, operation: &str) -> Result<T> {
        if let Err(err) = &self {
            log::error!("[{}] {}: {}", operation, err.category(), err);
        }
        self
    }

    fn log_recoverable(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("[{}] {}: {}", operation, err.category(), err);
                None
            }
        }
    }
}
