//! Installation of the skyboxd privileged network helper.
//!
//! skyboxd brokers the privileged socket operations the network relay is
//! not allowed to perform itself. Installing it copies the cached binary
//! into the managed bin directory and launches it under its service label.

use crate::error::{HostError, Result};
use crate::services::{DaemonSpec, DynSupervisor};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Privileged network helper label.
pub const SKYBOXD_LABEL: &str = "org.skybox.skyboxd";

/// Binary name of the helper, as shipped in the asset catalog.
const SKYBOXD_BINARY: &str = "skyboxd";

/// Shared handle to a helper installer.
pub type DynHelperInstaller = Arc<dyn HelperInstaller>;

/// Installs the privileged helper a session depends on.
#[async_trait]
pub trait HelperInstaller: Send + Sync {
    /// Installs and starts the helper. Installing an already-running helper
    /// is a no-op.
    async fn install(&self) -> Result<()>;
}

/// Installs skyboxd from the asset cache.
pub struct SkyboxdInstaller {
    cache_dir: PathBuf,
    bin_dir: PathBuf,
    socket_path: PathBuf,
    supervisor: DynSupervisor,
}

impl SkyboxdInstaller {
    /// Creates an installer that copies from `cache_dir` into `bin_dir` and
    /// points the helper at `socket_path`.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        bin_dir: impl Into<PathBuf>,
        socket_path: impl Into<PathBuf>,
        supervisor: DynSupervisor,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            bin_dir: bin_dir.into(),
            socket_path: socket_path.into(),
            supervisor,
        }
    }
}

#[async_trait]
impl HelperInstaller for SkyboxdInstaller {
    async fn install(&self) -> Result<()> {
        if self.supervisor.is_running(SKYBOXD_LABEL)? {
            debug!(label = SKYBOXD_LABEL, "helper already running");
            return Ok(());
        }

        let source = self.cache_dir.join(SKYBOXD_BINARY);
        if !source.exists() {
            return Err(HostError::daemon(
                SKYBOXD_LABEL,
                format!("{SKYBOXD_BINARY} is not cached; run 'skybox download' first"),
            ));
        }

        tokio::fs::create_dir_all(&self.bin_dir).await?;
        let installed = self.bin_dir.join(SKYBOXD_BINARY);
        tokio::fs::copy(&source, &installed).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&installed, std::fs::Permissions::from_mode(0o755)).await?;
        }

        let spec = DaemonSpec::new(SKYBOXD_LABEL, &installed).with_args([
            "--socket".to_string(),
            self.socket_path.display().to_string(),
        ]);
        self.supervisor.launch(spec).await?;
        Ok(())
    }
}
