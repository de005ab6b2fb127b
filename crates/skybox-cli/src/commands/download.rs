//! Download command implementation.

use anyhow::{Context, Result};
use skybox_core::{AssetCache, ResourceCache, TerminalUi, Ui};
use std::path::PathBuf;

/// Executes the download command.
pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    config
        .ensure_directories()
        .context("failed to prepare the skybox home directory")?;

    let ui = TerminalUi;
    ui.say("Downloading resources...");

    let cache = AssetCache::new(config.cache_dir());
    cache.sync(&config.catalog).await?;

    ui.say("All resources are ready.");
    Ok(())
}
