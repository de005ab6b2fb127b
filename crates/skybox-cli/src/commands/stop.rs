//! Stop command implementation.

use anyhow::{Context, Result};
use skybox_cli::wiring;
use std::path::PathBuf;

/// Executes the stop command.
pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    config
        .ensure_directories()
        .context("failed to prepare the skybox home directory")?;

    let stop = wiring::stop_command(&config)?;
    stop.execute().await
}
