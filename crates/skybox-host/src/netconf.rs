//! Loopback alias configuration.
//!
//! The director and router are addressed by stable IPs that must resolve on
//! the host before the VM exists, so the relevant addresses are aliased onto
//! the loopback interface ahead of any service launch.

use crate::command::DynCommandRunner;
use crate::error::{HostError, Result};
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to a host network configurer.
pub type DynHostNetwork = Arc<dyn HostNetwork>;

/// Applies host-side network configuration for a session.
#[async_trait]
pub trait HostNetwork: Send + Sync {
    /// Ensures `director` and `router` answer on the loopback interface.
    async fn add_loopback_aliases(&self, director: Ipv4Addr, router: Ipv4Addr) -> Result<()>;
}

/// Configures loopback aliases through the platform's network tooling.
pub struct LoopbackConfigurer {
    runner: DynCommandRunner,
}

impl LoopbackConfigurer {
    /// Creates a configurer that applies aliases through `runner`.
    #[must_use]
    pub fn new(runner: DynCommandRunner) -> Self {
        Self { runner }
    }

    async fn add_alias(&self, ip: Ipv4Addr) -> Result<()> {
        let command = alias_command(ip);
        match self.runner.output(&command).await {
            Ok(_) => {
                debug!(%ip, "loopback alias added");
                Ok(())
            }
            // Re-adding an alias that is already present is not an error.
            Err(crate::command::CommandError::Failed { stderr, .. })
                if stderr.to_lowercase().contains("exist") =>
            {
                debug!(%ip, "loopback alias already present");
                Ok(())
            }
            Err(err) => Err(HostError::Network(format!(
                "adding loopback alias {ip}: {err}"
            ))),
        }
    }
}

#[async_trait]
impl HostNetwork for LoopbackConfigurer {
    async fn add_loopback_aliases(&self, director: Ipv4Addr, router: Ipv4Addr) -> Result<()> {
        self.add_alias(director).await?;
        self.add_alias(router).await
    }
}

fn alias_command(ip: Ipv4Addr) -> String {
    if cfg!(target_os = "macos") {
        format!("ifconfig lo0 alias {ip}/32")
    } else if cfg!(target_os = "windows") {
        format!("netsh interface ip add address \"Loopback Pseudo-Interface 1\" {ip} 255.255.255.255")
    } else {
        // `replace` succeeds whether or not the address is already there.
        format!("ip address replace {ip}/32 dev lo")
    }
}
