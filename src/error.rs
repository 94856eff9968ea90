//! Error types for the bootstrapper.
//!
//! Classifies Kubernetes API failures into the outcomes the reconcile steps
//! branch on (not found, already exists) and everything else, which is fatal.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Error type for bootstrap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration input
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Key generation, signing, or stored key material failure
    #[error("Key pair store error: {0}")]
    Store(String),

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The whole run exceeded its deadline
    #[error("Bootstrap timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(e) if is_not_found(e))
    }

    /// Check if this error indicates the object was created concurrently
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::Kube(e) if is_already_exists(e))
    }

    /// Check if re-running the bootstrap could succeed without operator action
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube(e) => {
                // Retry on network errors, rate limiting, and server errors
                matches!(
                    e,
                    kube::Error::Api(api_err) if api_err.code >= 500 || api_err.code == 429
                ) || matches!(e, kube::Error::Service(_) | kube::Error::HyperError(_))
            }
            Error::Timeout(_) => true,
            Error::Config(_) | Error::Store(_) => false,
        }
    }
}

/// 404 from the API server
pub(crate) fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == 404)
}

/// 409 from the API server on create
pub(crate) fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == 409)
}

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, Error>;
