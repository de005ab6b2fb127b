//! Version command implementation.

use anyhow::Result;

/// Executes the version command.
pub async fn execute() -> Result<()> {
    println!("Skybox version {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Platform: {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );

    Ok(())
}
