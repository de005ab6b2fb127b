//! Telemetry command implementation.

use anyhow::Result;
use clap::Args;
use skybox_core::FileTelemetry;
use std::path::PathBuf;

/// Arguments for the telemetry command.
#[derive(Args)]
pub struct TelemetryArgs {
    /// 'on' or 'off'; omit to print the current state
    #[arg(value_parser = ["on", "off"])]
    pub state: Option<String>,
}

/// Executes the telemetry command.
pub async fn execute(config_path: Option<PathBuf>, args: TelemetryArgs) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    let telemetry = FileTelemetry::open(config.telemetry_dir())?;

    match args.state.as_deref() {
        Some(state) => {
            let enabled = state == "on";
            telemetry.set_enabled(enabled)?;
            println!("Telemetry is now {state}");
        }
        None => {
            let state = if telemetry.is_enabled() { "on" } else { "off" };
            println!("Telemetry is {state}");
        }
    }
    Ok(())
}
