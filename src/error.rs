use thiserror::Error;

use crate::ai::AiError;

/// Errors returned by every planwise operation.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("AI scheduling unavailable: {0}")]
    Ai(#[from] AiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlanError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }

    /// Errors that are the user's to fix, printed as a plain notice by the CLI.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_) | Self::Auth(_) | Self::Ai(_))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Raised when a stored or typed-in enum value does not parse.
#[derive(Debug, Clone, Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseValueError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseValueError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }
}

impl From<ParseValueError> for PlanError {
    fn from(err: ParseValueError) -> Self {
        Self::Validation(err.to_string())
    }
}
