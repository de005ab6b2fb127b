//! Virtual network relay driver.
//!
//! netkit bridges the VM's network onto the host: it owns the VM-facing
//! socket, asks skyboxd for the privileged port operations, and forwards the
//! guest platform API onto localhost.

use crate::error::{ProcessError, Result};
use crate::watch::{spawn_exit_watch, CrashSender, WATCH_INTERVAL};
use async_trait::async_trait;
use skybox_host::{DaemonSpec, DynSupervisor};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Service label for the network relay.
pub const NETKIT_LABEL: &str = "org.skybox.netkit";

/// Host address the guest platform API is forwarded to.
pub const API_FORWARD_ADDR: &str = "127.0.0.1:9241";

/// Shared handle to a network driver.
pub type DynNetworkDriver = Arc<dyn NetworkDriver>;

/// Starts, watches, and stops the virtual network relay.
#[async_trait]
pub trait NetworkDriver: Send + Sync {
    /// Launches the relay process.
    async fn start(&self) -> Result<()>;

    /// Registers the exit watch for the relay. Callable once per instance.
    fn watch(&self, crash_tx: CrashSender) -> Result<()>;

    /// Stops the relay without raising a crash report.
    async fn stop(&self) -> Result<()>;
}

/// Driver for the netkit relay binary from the asset cache.
pub struct NetkitDriver {
    supervisor: DynSupervisor,
    cache_dir: PathBuf,
    network_state_dir: PathBuf,
    stopping: Arc<AtomicBool>,
    watched: AtomicBool,
    watch_interval: Duration,
}

impl NetkitDriver {
    /// Creates a driver launching netkit from `cache_dir` with state under
    /// `network_state_dir`.
    pub fn new(
        supervisor: DynSupervisor,
        cache_dir: impl Into<PathBuf>,
        network_state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            supervisor,
            cache_dir: cache_dir.into(),
            network_state_dir: network_state_dir.into(),
            stopping: Arc::new(AtomicBool::new(false)),
            watched: AtomicBool::new(false),
            watch_interval: WATCH_INTERVAL,
        }
    }

    /// The socket the VM attaches its network interface to.
    #[must_use]
    pub fn vm_socket(&self) -> PathBuf {
        self.network_state_dir.join("netkit.sock")
    }

    /// The socket skyboxd serves privileged operations on.
    #[must_use]
    pub fn helper_socket(&self) -> PathBuf {
        self.network_state_dir.join("skyboxd.sock")
    }

    fn daemon_spec(&self) -> Result<DaemonSpec> {
        let program = self.cache_dir.join("netkit");
        if !program.exists() {
            return Err(ProcessError::launch(
                NETKIT_LABEL,
                "netkit is not cached; run 'skybox download' first",
            ));
        }
        Ok(DaemonSpec::new(NETKIT_LABEL, program).with_args([
            "--socket".to_string(),
            self.vm_socket().display().to_string(),
            "--helper-socket".to_string(),
            self.helper_socket().display().to_string(),
            "--state".to_string(),
            self.network_state_dir.display().to_string(),
            "--api-forward".to_string(),
            API_FORWARD_ADDR.to_string(),
        ]))
    }
}

#[async_trait]
impl NetworkDriver for NetkitDriver {
    async fn start(&self) -> Result<()> {
        let spec = self.daemon_spec()?;
        let pid = self.supervisor.launch(spec).await?;
        info!(label = NETKIT_LABEL, pid, "network relay started");
        Ok(())
    }

    fn watch(&self, crash_tx: CrashSender) -> Result<()> {
        if self.watched.swap(true, Ordering::SeqCst) {
            return Err(ProcessError::AlreadyWatched {
                label: NETKIT_LABEL.to_string(),
            });
        }
        spawn_exit_watch(
            self.supervisor.clone(),
            NETKIT_LABEL,
            self.stopping.clone(),
            self.watch_interval,
            crash_tx,
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        // The flag must be visible to the watcher before the process dies.
        self.stopping.store(true, Ordering::SeqCst);
        self.supervisor.stop(NETKIT_LABEL).await?;
        Ok(())
    }
}
