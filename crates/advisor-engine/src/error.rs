//! Error types for scoring and advisory operations

use thiserror::Error;

/// Errors surfaced by the advisory engine
///
/// Analyzers never return these for bad market data; they degrade to a
/// low-confidence neutral sub-score instead. Errors are reserved for
/// configuration problems and for strict-mode evaluations with no usable data.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Invalid weights or thresholds, rejected before any evaluation runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// Strict mode was requested and no domain produced usable data
    #[error("Insufficient data for {symbol}: all sub-score confidences are zero")]
    InsufficientData { symbol: String },

    /// Technical indicator could not be constructed
    #[error("Technical indicator error: {0}")]
    Indicator(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

impl From<ta::errors::TaError> for AdvisorError {
    fn from(err: ta::errors::TaError) -> Self {
        AdvisorError::Indicator(err.to_string())
    }
}
