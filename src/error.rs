//! Error types for askdb.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

use crate::safety::SafetyViolation;

/// Main error type for askdb operations.
#[derive(Error, Debug)]
pub enum AskError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors carrying the driver diagnostic (unknown column, syntax, etc.)
    #[error("Database error: {0}")]
    Query(String),

    /// Completion service errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),

    /// The natural-language request itself was unusable (e.g. blank).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The repair loop used its whole attempt budget without an executable statement.
    #[error("Failed to generate valid SQL after {attempts} attempts. Last error: {last_error}")]
    GenerationExhausted { attempts: u32, last_error: String },

    /// The semantic validator judged the query invalid.
    #[error("Invalid query: {0}")]
    ValidationRejected(String),

    /// The static safety filter rejected the query.
    #[error("Unsafe SQL detected ({0}). Query rejected.")]
    SafetyRejected(SafetyViolation),
}

impl AskError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates an invalid-request error with the given message.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Creates a validation rejection with the given reason.
    pub fn validation_rejected(reason: impl Into<String>) -> Self {
        Self::ValidationRejected(reason.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Database Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
            Self::InvalidRequest(_) => "Invalid Request",
            Self::GenerationExhausted { .. } => "Generation Exhausted",
            Self::ValidationRejected(_) => "Validation Rejected",
            Self::SafetyRejected(_) => "Safety Rejected",
        }
    }

    /// Returns true if the repair loop may feed this error back to the model.
    ///
    /// Only database diagnostics qualify; everything else ends the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Returns the raw diagnostic for database errors, or the full message otherwise.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Query(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Returns the single client-visible rejection reason.
    ///
    /// Every failure maps to the same "bad request" class at the boundary;
    /// only the reason text differs.
    pub fn client_reason(&self) -> String {
        match self {
            Self::Internal(_) => "Internal error while processing the request.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using AskError.
pub type Result<T> = std::result::Result<T, AskError>;
