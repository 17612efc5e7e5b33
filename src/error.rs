//! Error types for the booking terminal

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Session expired")]
    AuthorizationExpired,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend unreachable: {0}")]
    Transient(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// User-facing notice text for this error. Notices are the only error
    /// surface of the terminal; technical detail stays in the logs.
    pub fn notice_message(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => {
                "Unknown or inactive account. Check the tag or credentials."
            }
            AppError::AuthorizationExpired => "Session expired. Please log in again.",
            AppError::Conflict(_) | AppError::NotFound(_) => "The action could not be completed.",
            AppError::Transient(_) => "Backend unreachable. Check the connection.",
            AppError::Validation(_) => "Invalid input.",
            AppError::Internal(_) => "Something went wrong.",
        }
    }

    /// True for errors that must force the session back to anonymous.
    pub fn forces_logout(&self) -> bool {
        matches!(self, AppError::AuthorizationExpired)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
