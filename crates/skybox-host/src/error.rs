//! Error types for host integration.

use crate::command::CommandError;
use thiserror::Error;

/// Convenience alias for host results.
pub type Result<T> = std::result::Result<T, HostError>;

/// An error that pairs an operator-facing instruction with the raw
/// diagnostic behind it. `Display` shows only the instruction; the
/// diagnostic stays available for logs and assertions.
#[derive(Debug, Clone, Error)]
#[error("{instruction}")]
pub struct Guidance {
    instruction: String,
    detail: String,
}

impl Guidance {
    /// Wraps a diagnostic `detail` behind a displayable `instruction`.
    pub fn new(instruction: impl Into<String>, detail: impl Into<String>) -> Self {
        let guidance = Self {
            instruction: instruction.into(),
            detail: detail.into(),
        };
        tracing::debug!(detail = %guidance.detail, "diagnostic wrapped for display");
        guidance
    }

    /// The message shown to the operator.
    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// The underlying diagnostic.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Host integration error type.
#[derive(Debug, Error)]
pub enum HostError {
    /// The current user lacks the elevation the platform needs.
    #[error("{0}")]
    Privilege(Guidance),

    /// The hypervisor feature is turned off on this machine.
    #[error("{0}")]
    HypervisorDisabled(Guidance),

    /// A capability query itself failed, as opposed to returning a
    /// clean negative answer.
    #[error("{check}: {source}")]
    Command {
        check: &'static str,
        #[source]
        source: CommandError,
    },

    /// A supervised service operation failed.
    #[error("service '{label}': {reason}")]
    Daemon { label: String, reason: String },

    /// Loopback alias configuration failed.
    #[error("network configuration: {0}")]
    Network(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Builds a [`HostError::Daemon`].
    pub fn daemon(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Daemon {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error asks the operator to re-run elevated.
    #[must_use]
    pub const fn is_privilege(&self) -> bool {
        matches!(self, Self::Privilege(_))
    }

    /// Whether this error asks the operator to enable the hypervisor.
    #[must_use]
    pub const fn is_hypervisor_disabled(&self) -> bool {
        matches!(self, Self::HypervisorDisabled(_))
    }
}
