//! Error types for the vestibule CLI

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub enum CliError {
    /// No secret on the command line or in the environment
    #[error("No signing secret given. Pass --secret or set SESSION_SECRET")]
    MissingSecret,

    /// Secret rejected by the hard minimum
    #[error("{0}")]
    Secret(#[from] vestibule::SecretError),

    /// Secret accepted but flagged, with --strict
    #[error("Secret has {count} advisory warning(s)")]
    SecretWarnings { count: usize },

    /// Token could not be minted
    #[error("Failed to mint token: {0}")]
    Session(#[from] vestibule::SessionError),

    /// Token did not verify
    #[error("Token is invalid, expired, or signed with a different secret")]
    InvalidToken,

    /// Invalid argument value
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Logging setup failed
    #[error("{0}")]
    Observability(#[from] vestibule::observability::ObservabilityError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create an invalid value error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
