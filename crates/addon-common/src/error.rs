//! Error types for the addon operator
//!
//! Errors carry the resource and operation they relate to so that the
//! controller's error policy can log them without extra context.

use thiserror::Error;

/// Boxed error preserving the original cause of a remote failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for addon operator operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A runtime option could not be toggled
    #[error("runtime option {option} failed: {message}")]
    RuntimeOption {
        /// Name of the option (e.g., "global-pause")
        option: String,
        /// Description of what failed
        message: String,
    },

    /// Call to the OCM addon status service failed
    #[error("OCM {operation} for addon {addon} failed: {source}")]
    Ocm {
        /// Remote operation that failed (get, post, patch)
        operation: String,
        /// Addon the call was made for
        addon: String,
        /// HTTP status code, when the service answered
        status_code: Option<u16>,
        /// The original client error
        #[source]
        source: BoxError,
    },

    /// Configuration error (missing secret, invalid endpoint, ...)
    #[error("configuration error for {resource}: {message}")]
    Config {
        /// Resource whose configuration is invalid
        resource: String,
        /// Description of what's invalid
        message: String,
    },

    /// Internal/operational error
    #[error("internal error: {message}")]
    Internal {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a runtime option error
    pub fn runtime_option(option: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::RuntimeOption {
            option: option.into(),
            message: msg.into(),
        }
    }

    /// Wrap a failed OCM call, keeping the original error as the source
    pub fn ocm(
        operation: impl Into<String>,
        addon: impl Into<String>,
        status_code: Option<u16>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Ocm {
            operation: operation.into(),
            addon: addon.into(),
            status_code,
            source: source.into(),
        }
    }

    /// Create a configuration error for a resource
    pub fn config(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
        }
    }

    /// HTTP status code of a failed OCM call
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Ocm { status_code, .. } => *status_code,
            Error::Kube {
                source: kube::Error::Api(ae),
            } => Some(ae.code),
            _ => None,
        }
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Kube { .. } => "kube",
            Error::RuntimeOption { .. } => "runtime_option",
            Error::Ocm { .. } => "ocm",
            Error::Config { .. } => "config",
            Error::Internal { .. } => "internal",
        }
    }
}
