//! Error types for the process drivers.

use skybox_host::HostError;
use thiserror::Error;

/// Convenience alias for driver results.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Driver error type.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A driver could not assemble or launch its process.
    #[error("launching {label}: {reason}")]
    Launch { label: String, reason: String },

    /// A second exit watch was requested on the same driver instance.
    #[error("{label} is already being watched")]
    AlreadyWatched { label: String },

    /// An underlying host operation failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl ProcessError {
    /// Builds a [`ProcessError::Launch`].
    pub fn launch(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Launch {
            label: label.into(),
            reason: reason.into(),
        }
    }
}
