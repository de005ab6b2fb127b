//! Error types for the Skybox core crate.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The dependency catalog violates an invariant.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A catalog asset could not be fetched or verified.
    #[error("asset '{name}': {reason}")]
    Asset { name: String, reason: String },

    /// Telemetry state could not be read or written.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// HTTP transfer failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a catalog error.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Creates an asset error.
    pub fn asset(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Asset {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::config("missing home directory");
        assert_eq!(err.to_string(), "configuration error: missing home directory");

        let err = CoreError::asset("vmkit", "checksum mismatch");
        assert_eq!(err.to_string(), "asset 'vmkit': checksum mismatch");
    }
}
