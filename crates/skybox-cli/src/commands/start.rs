//! Start command implementation.

use anyhow::{Context, Result};
use clap::Args;
use skybox_cli::{session, wiring};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Number of CPUs for the VM (0 selects the configured default)
    #[arg(short, long, default_value_t = 0)]
    pub cpus: u32,

    /// VM memory in MB (0 selects the configured default)
    #[arg(short, long, default_value_t = 0)]
    pub memory: u32,
}

/// Executes the start command.
pub async fn execute(config_path: Option<PathBuf>, args: StartArgs) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    config
        .ensure_directories()
        .context("failed to prepare the skybox home directory")?;

    // The host must be able to run the VM before anything is launched.
    let preflight = skybox_host::preflight::for_current_platform();
    preflight.check_requirements().await?;

    let (crash_tx, mut crash_rx) = tokio::sync::mpsc::unbounded_channel();
    let start = wiring::start_command(config, crash_tx)?;

    let shutdown = CancellationToken::new();
    let listener_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Some(label) = crash_rx.recv().await {
            error!(label, "background service exited unexpectedly");
            listener_shutdown.cancel();
        }
    });

    let args = session::StartArgs {
        cpus: args.cpus,
        memory_mb: args.memory,
    };
    tokio::select! {
        result = start.execute(args) => result,
        () = shutdown.cancelled() => {
            anyhow::bail!("a background service exited unexpectedly during startup")
        }
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("interrupted")
        }
    }
}
