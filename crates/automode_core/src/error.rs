use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for hosts embedding automatic model selection.
#[derive(Error, Debug)]
pub enum AutoModeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model catalog error: {0}")]
    Catalog(String),

    #[error("No model available: {0}")]
    NoModel(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caller misuse (unsupported operation, cancellation).
    UserError,
    /// The model catalog failed or had nothing usable.
    ProviderError,
    /// Invalid or missing configuration.
    ConfigError,
    /// Anything else.
    SystemError,
}

impl AutoModeError {
    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::ConfigError,
            Self::Catalog(_) | Self::NoModel(_) => ErrorCategory::ProviderError,
            Self::Unsupported(_) | Self::Cancelled => ErrorCategory::UserError,
            Self::Internal(_) => ErrorCategory::SystemError,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Catalog(_) => "Could not load the list of models. Check your connection.".into(),
            Self::NoModel(_) => "No model is currently available for automatic selection.".into(),
            Self::Unsupported(op) => format!("'{op}' must be called on a concrete model"),
            Self::Cancelled => "Request cancelled.".into(),
            Self::Internal(_) => "Something went wrong.".into(),
        }
    }
}
