//! Authentication error types.

use thiserror::Error;

/// Fallback message when registration fails without a backend message.
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

/// Fallback message when login fails without a backend message.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// Errors that can occur during login or registration.
///
/// Messages are meant to be shown inline to the admin as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Input rejected before contacting the backend.
    #[error("{0}")]
    InvalidInput(String),

    /// The backend refused the request or could not be reached.
    #[error("{0}")]
    Rejected(String),
}

impl From<hr_feedback_core::EmailError> for AuthError {
    fn from(e: hr_feedback_core::EmailError) -> Self {
        Self::InvalidInput(format!("Invalid email: {e}"))
    }
}
