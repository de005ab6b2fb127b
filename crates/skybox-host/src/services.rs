//! Background service supervision.
//!
//! Services launched here outlive the CLI invocation: each one is spawned
//! into its own process group with output appended to a per-service log, and
//! a pidfile under the run directory records its identity. Liveness is
//! probed with a zero signal against the recorded pid, so any later
//! invocation can answer "is the VM still up" without holding a child
//! handle.

use crate::error::{HostError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// How a background service should be launched.
#[derive(Debug, Clone)]
pub struct DaemonSpec {
    /// Unique service label, also the pidfile and log file stem.
    pub label: String,
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Environment variables set for the service.
    pub env: Vec<(String, String)>,
    /// Working directory, inherited when `None`.
    pub workdir: Option<PathBuf>,
}

impl DaemonSpec {
    /// Creates a spec with no extra environment and an inherited workdir.
    pub fn new(label: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            workdir: None,
        }
    }

    /// Appends arguments to the spec.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Shared handle to a service supervisor.
pub type DynSupervisor = Arc<dyn ServiceSupervisor>;

/// Launches and tracks long-lived background services.
#[async_trait]
pub trait ServiceSupervisor: Send + Sync {
    /// Starts a service and records its pid. Returns the pid.
    async fn launch(&self, spec: DaemonSpec) -> Result<u32>;

    /// Whether the labeled service is currently running.
    fn is_running(&self, label: &str) -> Result<bool>;

    /// Stops the labeled service if it is running and forgets it.
    async fn stop(&self, label: &str) -> Result<()>;
}

/// Pidfile-backed supervisor.
pub struct ServiceManager {
    run_dir: PathBuf,
    log_dir: PathBuf,
}

impl ServiceManager {
    /// Creates a supervisor recording pidfiles under `run_dir` and logs
    /// under `log_dir`.
    pub fn new(run_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
            log_dir: log_dir.into(),
        }
    }

    fn pidfile(&self, label: &str) -> PathBuf {
        self.run_dir.join(format!("{label}.pid"))
    }

    fn logfile(&self, label: &str) -> PathBuf {
        self.log_dir.join(format!("{label}.log"))
    }

    /// Reads the recorded pid for `label`. A missing or unreadable pidfile
    /// means the service is not tracked.
    fn read_pid(&self, label: &str) -> Option<u32> {
        let path = self.pidfile(label);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(label, error = %err, "failed to read pidfile");
                return None;
            }
        };
        match contents.trim().parse::<u32>() {
            Ok(pid) => Some(pid),
            Err(_) => {
                warn!(label, path = %path.display(), "ignoring corrupt pidfile");
                None
            }
        }
    }
}

#[async_trait]
impl ServiceSupervisor for ServiceManager {
    async fn launch(&self, spec: DaemonSpec) -> Result<u32> {
        if self.is_running(&spec.label)? {
            return Err(HostError::daemon(&spec.label, "already running"));
        }

        tokio::fs::create_dir_all(&self.run_dir).await?;
        tokio::fs::create_dir_all(&self.log_dir).await?;

        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.logfile(&spec.label))?;
        let log_err = log.try_clone()?;

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().cloned())
            .stdin(std::process::Stdio::null())
            .stdout(log)
            .stderr(log_err)
            .kill_on_drop(false);
        if let Some(workdir) = &spec.workdir {
            command.current_dir(workdir);
        }
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|err| {
            HostError::daemon(
                &spec.label,
                format!("failed to spawn {}: {err}", spec.program.display()),
            )
        })?;
        let pid = child
            .id()
            .ok_or_else(|| HostError::daemon(&spec.label, "spawned without a pid"))?;

        tokio::fs::write(self.pidfile(&spec.label), format!("{pid}\n")).await?;
        info!(label = %spec.label, pid, "service started");
        Ok(pid)
    }

    fn is_running(&self, label: &str) -> Result<bool> {
        match self.read_pid(label) {
            Some(pid) => Ok(process_alive(pid)),
            None => Ok(false),
        }
    }

    async fn stop(&self, label: &str) -> Result<()> {
        let Some(pid) = self.read_pid(label) else {
            debug!(label, "no pidfile, nothing to stop");
            return Ok(());
        };

        terminate(pid);
        match tokio::fs::remove_file(self.pidfile(label)).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        info!(label, pid, "service stopped");
        Ok(())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        // Signalling a live process owned by another user is denied, but
        // the process does exist.
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    // Without a signal probe, the pidfile itself is the record.
    true
}

#[cfg(unix)]
fn terminate(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(pid) {
        if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            debug!(pid, error = %err, "SIGTERM not delivered");
        }
    }
}

#[cfg(not(unix))]
fn terminate(pid: u32) {
    debug!(pid, "signal-based stop not available on this platform");
}
