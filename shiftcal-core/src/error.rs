//! Error types for shiftcal.

use thiserror::Error;

/// Errors that can occur in shiftcal operations.
#[derive(Error, Debug)]
pub enum ShiftError {
    /// A date or time string could not be split into its components.
    #[error("Format error: {0}")]
    Format(String),

    /// Input was well-formed but breaks a shift rule (bad HH:MM, backwards day shift, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Calendar file assembly failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShiftError {
    /// True for errors caused by bad caller input rather than a failing dependency.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ShiftError::Format(_) | ShiftError::Validation(_))
    }
}

/// Result type alias for shiftcal operations.
pub type ShiftResult<T> = Result<T, ShiftError>;
