//! Error types for the summarization engine.

use thiserror::Error;

/// Unified error type covering every failure category the engine reports.
///
/// Each variant maps to a stable category string (see [`SumAiError::category`])
/// so that callers can branch on the kind of failure without matching on
/// display text.
#[derive(Debug, Error)]
pub enum SumAiError {
    /// The generation backend could not be loaded or reached.
    #[error("generation backend unavailable: {0}")]
    ModelUnavailable(String),

    /// The caller asked for a summarization strategy the engine does not know.
    #[error("unknown summarization strategy: {0}")]
    InvalidStrategy(String),

    /// The evaluation dataset file does not exist.
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    /// An evaluation run produced zero scoreable rows.
    #[error("no valid samples found for evaluation")]
    NoValidSamples,

    /// The dataset file exists but could not be parsed.
    #[error("dataset parse error: {0}")]
    Dataset(String),

    /// Configuration file errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP-level errors from the remote generation backend.
    #[error("generation request failed: {0}")]
    Http(String),
}

impl SumAiError {
    /// Stable categorical reason, distinct from the free-text message.
    pub fn category(&self) -> &'static str {
        match self {
            SumAiError::ModelUnavailable(_) => "model_unavailable",
            SumAiError::InvalidStrategy(_) => "invalid_strategy",
            SumAiError::DatasetNotFound(_) => "dataset_not_found",
            SumAiError::NoValidSamples => "no_valid_samples",
            SumAiError::Dataset(_) => "dataset_error",
            SumAiError::Config(_) => "config_error",
            SumAiError::Io(_) => "io_error",
            SumAiError::Http(_) => "http_error",
        }
    }
}

impl From<reqwest::Error> for SumAiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SumAiError::ModelUnavailable(err.to_string())
        } else {
            SumAiError::Http(err.to_string())
        }
    }
}

impl From<csv::Error> for SumAiError {
    fn from(err: csv::Error) -> Self {
        SumAiError::Dataset(err.to_string())
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SumAiError>;
