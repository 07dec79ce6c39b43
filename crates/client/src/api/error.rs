//! Backend API errors.

use thiserror::Error;

/// Errors that can occur when calling the feedback backend.
///
/// Transport errors are flattened to strings so the type stays `Clone` and
/// callers never see a raw `reqwest::Error`.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request could not be sent or timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("Backend returned HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: u16,
        /// The `error` field of the response body, when present.
        message: Option<String>,
    },

    /// The backend answered 2xx but with an `{ "error": ... }` body.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The response body did not have the expected shape.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    /// The client could not be constructed.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// User-displayable message supplied by the backend, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            }
            | Self::Backend(message) => Some(message),
            _ => None,
        }
    }
}
