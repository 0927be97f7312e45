//! Errors returned by the OCM client

use thiserror::Error;

/// HTTP status code OCM answers with when no status exists for an addon
pub const NOT_FOUND: u16 = 404;

/// Error returned by [`crate::OcmClient`] operations
#[derive(Debug, Error)]
pub enum OcmError {
    /// The service answered with a non-success status code
    #[error("OCM API returned status {status_code}: {body}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The request never got an answer (connection failure, timeout, ...)
    #[error("OCM API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded
    #[error("failed to decode OCM API response: {0}")]
    Decode(String),

    /// The client configuration is unusable
    #[error("invalid OCM client configuration: {0}")]
    Config(String),
}

impl OcmError {
    /// Build a status error with an empty body
    pub fn status(status_code: u16) -> Self {
        Self::Status {
            status_code,
            body: String::new(),
        }
    }

    /// HTTP status code, when the service answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status_code, .. } => Some(*status_code),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Config(_) => None,
        }
    }

    /// Whether the service reported that the addon status does not exist
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(NOT_FOUND)
    }
}
