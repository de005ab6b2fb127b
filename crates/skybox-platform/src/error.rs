//! Error types for the platform API client.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for platform client results.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Platform API error type.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The API endpoint refused the connection.
    #[error("platform API is unreachable at {base_url}: {reason}")]
    Unreachable { base_url: String, reason: String },

    /// The API answered with a non-success status.
    #[error("{op} failed with status {status}: {message}")]
    Api {
        op: &'static str,
        status: u16,
        message: String,
    },

    /// Transport-level failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// An operation did not complete within its deadline.
    #[error("{op} did not complete within {waited:?}")]
    Timeout { op: &'static str, waited: Duration },
}
