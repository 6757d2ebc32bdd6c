//! Error types for TripScore

use thiserror::Error;

/// Errors raised at the parsing, configuration and host boundaries.
///
/// Sample processing itself never fails: malformed samples degrade to
/// skipped computations instead of errors.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("No active trip")]
    NoActiveTrip,
}
