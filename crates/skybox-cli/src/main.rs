//! Skybox CLI - a local container platform in a box.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    let filter = if cli.debug {
        "skybox=debug,skybox_core=debug,skybox_host=debug,skybox_process=debug,skybox_platform=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli.config.clone();
    match cli.command {
        Commands::Start(args) => commands::start::execute(config_path, args).await,
        Commands::Stop => commands::stop::execute(config_path).await,
        Commands::Download => commands::download::execute(config_path).await,
        Commands::Telemetry(args) => commands::telemetry::execute(config_path, args).await,
        Commands::Version => commands::version::execute().await,
    }
}
