//! Shell command execution.
//!
//! Preflight checks and loopback configuration shell out to the host; this
//! module owns that seam so callers can be exercised with scripted fakes.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;

/// Error from running a query command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Shared handle to a command runner.
pub type DynCommandRunner = Arc<dyn CommandRunner>;

/// Runs a host query command and returns its trimmed stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Executes `command` and returns trimmed standard output.
    async fn output(&self, command: &str) -> Result<String, CommandError>;
}

/// Runs queries through PowerShell.
pub struct PowershellRunner {
    program: String,
}

impl PowershellRunner {
    /// Creates a runner using `powershell.exe` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "powershell.exe".to_string(),
        }
    }
}

impl Default for PowershellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for PowershellRunner {
    async fn output(&self, command: &str) -> Result<String, CommandError> {
        run(
            &self.program,
            &["-NoProfile", "-NonInteractive", "-Command", command],
        )
        .await
    }
}

/// Runs queries through `/bin/sh`.
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn output(&self, command: &str) -> Result<String, CommandError> {
        run("/bin/sh", &["-c", command]).await
    }
}

async fn run(program: &str, args: &[&str]) -> Result<String, CommandError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
