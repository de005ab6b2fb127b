//! CLI command implementations.
//!
//! One module per subcommand: `start` and `stop` for the session lifecycle,
//! `download` for a cache-only sync of the dependency catalog, `telemetry`
//! for the persisted opt-in toggle, and `version` for build information.

use anyhow::Result;
use clap::{Parser, Subcommand};
use skybox_core::config::Config;
use std::path::{Path, PathBuf};

pub mod download;
pub mod start;
pub mod stop;
pub mod telemetry;
pub mod version;

/// Skybox - local container platform in a box
#[derive(Parser)]
#[command(name = "skybox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a configuration file
    ///
    /// Defaults to the system and user configuration files plus
    /// SKYBOX_-prefixed environment variables.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the VM and deploy the platform into it
    Start(start::StartArgs),

    /// Stop the VM, the virtual network, and the helper
    Stop,

    /// Download the dependency catalog into the local cache
    Download,

    /// Show or change the telemetry opt-in
    Telemetry(telemetry::TelemetryArgs),

    /// Show version information
    Version,
}

/// Loads configuration, preferring an explicit file when one was given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
