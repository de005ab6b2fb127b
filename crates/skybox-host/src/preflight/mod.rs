//! Host capability checks that run before a session starts.

pub mod windows;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use windows::HypervPreflight;

/// Shared handle to a preflight implementation.
pub type DynPreflight = Arc<dyn Preflight>;

/// Verifies the host can run the platform before anything is launched.
#[async_trait]
pub trait Preflight: Send + Sync {
    /// Returns `Ok(())` when the host satisfies every requirement.
    async fn check_requirements(&self) -> Result<()>;
}

/// Preflight for hosts with no elevation or hypervisor-feature model.
#[derive(Debug, Default)]
pub struct NoopPreflight;

#[async_trait]
impl Preflight for NoopPreflight {
    async fn check_requirements(&self) -> Result<()> {
        Ok(())
    }
}

/// Returns the preflight implementation for the current platform.
#[must_use]
pub fn for_current_platform() -> DynPreflight {
    #[cfg(windows)]
    {
        Arc::new(HypervPreflight::new(Arc::new(
            crate::command::PowershellRunner::new(),
        )))
    }
    #[cfg(not(windows))]
    {
        Arc::new(NoopPreflight)
    }
}
