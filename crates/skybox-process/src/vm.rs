//! VM runtime driver.
//!
//! vmkit boots the platform VM from the cached kernel and root filesystem
//! and attaches its network interface to the relay socket.

use crate::error::{ProcessError, Result};
use crate::watch::{spawn_exit_watch, CrashSender, WATCH_INTERVAL};
use async_trait::async_trait;
use skybox_core::config::VmDefaults;
use skybox_host::{DaemonSpec, DynSupervisor};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Service label for the VM runtime.
pub const VMKIT_LABEL: &str = "org.skybox.vmkit";

/// Kernel image name in the asset cache.
const KERNEL_ASSET: &str = "skybox-kernel";

/// Root filesystem image name in the asset cache.
const ROOTFS_ASSET: &str = "skybox-rootfs.img";

/// Shared handle to a VM driver.
pub type DynVmDriver = Arc<dyn VmDriver>;

/// Starts, watches, and stops the platform VM.
#[async_trait]
pub trait VmDriver: Send + Sync {
    /// Boots the VM. A zero `cpus` or `memory_mb` selects the configured
    /// default sizing.
    async fn start(&self, cpus: u32, memory_mb: u32) -> Result<()>;

    /// Registers the exit watch for the VM. Callable once per instance.
    fn watch(&self, crash_tx: CrashSender) -> Result<()>;

    /// Shuts the VM down without raising a crash report.
    async fn stop(&self) -> Result<()>;
}

/// Driver for the vmkit binary from the asset cache.
pub struct VmkitDriver {
    supervisor: DynSupervisor,
    cache_dir: PathBuf,
    state_dir: PathBuf,
    network_socket: PathBuf,
    defaults: VmDefaults,
    stopping: Arc<AtomicBool>,
    watched: AtomicBool,
    watch_interval: Duration,
}

impl VmkitDriver {
    /// Creates a driver booting vmkit from `cache_dir`, keeping VM state
    /// under `state_dir` and attaching to the relay at `network_socket`.
    pub fn new(
        supervisor: DynSupervisor,
        cache_dir: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
        network_socket: impl Into<PathBuf>,
        defaults: VmDefaults,
    ) -> Self {
        Self {
            supervisor,
            cache_dir: cache_dir.into(),
            state_dir: state_dir.into(),
            network_socket: network_socket.into(),
            defaults,
            stopping: Arc::new(AtomicBool::new(false)),
            watched: AtomicBool::new(false),
            watch_interval: WATCH_INTERVAL,
        }
    }

    fn daemon_spec(&self, cpus: u32, memory_mb: u32) -> Result<DaemonSpec> {
        let program = self.cache_dir.join("vmkit");
        if !program.exists() {
            return Err(ProcessError::launch(
                VMKIT_LABEL,
                "vmkit is not cached; run 'skybox download' first",
            ));
        }
        for asset in [KERNEL_ASSET, ROOTFS_ASSET] {
            if !self.cache_dir.join(asset).exists() {
                return Err(ProcessError::launch(
                    VMKIT_LABEL,
                    format!("{asset} is not cached; run 'skybox download' first"),
                ));
            }
        }
        Ok(DaemonSpec::new(VMKIT_LABEL, program).with_args([
            "--cpus".to_string(),
            cpus.to_string(),
            "--memory".to_string(),
            memory_mb.to_string(),
            "--kernel".to_string(),
            self.cache_dir.join(KERNEL_ASSET).display().to_string(),
            "--rootfs".to_string(),
            self.cache_dir.join(ROOTFS_ASSET).display().to_string(),
            "--state".to_string(),
            self.state_dir.display().to_string(),
            "--network-socket".to_string(),
            self.network_socket.display().to_string(),
        ]))
    }
}

#[async_trait]
impl VmDriver for VmkitDriver {
    async fn start(&self, cpus: u32, memory_mb: u32) -> Result<()> {
        let cpus = if cpus == 0 { self.defaults.cpus } else { cpus };
        let memory_mb = if memory_mb == 0 {
            self.defaults.memory_mb
        } else {
            memory_mb
        };

        let spec = self.daemon_spec(cpus, memory_mb)?;
        let pid = self.supervisor.launch(spec).await?;
        info!(label = VMKIT_LABEL, pid, cpus, memory_mb, "VM started");
        Ok(())
    }

    fn watch(&self, crash_tx: CrashSender) -> Result<()> {
        if self.watched.swap(true, Ordering::SeqCst) {
            return Err(ProcessError::AlreadyWatched {
                label: VMKIT_LABEL.to_string(),
            });
        }
        spawn_exit_watch(
            self.supervisor.clone(),
            VMKIT_LABEL,
            self.stopping.clone(),
            self.watch_interval,
            crash_tx,
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stopping.store(true, Ordering::SeqCst);
        self.supervisor.stop(VMKIT_LABEL).await?;
        Ok(())
    }
}
