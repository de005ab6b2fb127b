//! Windows preflight: elevation and Hyper-V feature state.
//!
//! Both checks shell out to PowerShell, so that a session never gets as far
//! as launching services on a machine that cannot host the VM. A query that
//! fails to execute is reported as a [`HostError::Command`] with the check
//! being performed; it is never conflated with a clean negative answer.

use super::Preflight;
use crate::command::DynCommandRunner;
use crate::error::{Guidance, HostError, Result};
use async_trait::async_trait;

const ADMIN_ROLE: &str = "[Security.Principal.WindowsBuiltInRole]::Administrator";
const CURRENT_USER: &str =
    "New-Object Security.Principal.WindowsPrincipal([Security.Principal.WindowsIdentity]::GetCurrent())";

/// Hyper-V feature name on desktop editions.
const HYPERV_DESKTOP_FEATURE: &str = "Microsoft-Hyper-V-All";
/// Hyper-V feature name on server editions.
const HYPERV_SERVER_FEATURE: &str = "Microsoft-Hyper-V-Management-PowerShell";

const PRIVILEGE_INSTRUCTION: &str = "You must run skybox with an admin privileged PowerShell";

const HYPERV_DISABLED_INSTRUCTION: &str = "You must first enable Hyper-V on your machine before you run Skybox. Please use the following tutorial to enable this functionality on your machine

https://docs.microsoft.com/en-us/virtualization/hyper-v-on-windows/quick-start/enable-hyper-v";

/// Checks elevation and Hyper-V availability through PowerShell.
pub struct HypervPreflight {
    powershell: DynCommandRunner,
}

impl HypervPreflight {
    /// Creates a preflight that queries through `powershell`.
    #[must_use]
    pub fn new(powershell: DynCommandRunner) -> Self {
        Self { powershell }
    }

    async fn check_elevated(&self) -> Result<()> {
        let command = format!("({CURRENT_USER}).IsInRole({ADMIN_ROLE})");
        let output = self
            .powershell
            .output(&command)
            .await
            .map_err(|source| HostError::Command {
                check: "checking for admin privileges",
                source,
            })?;

        if output.to_lowercase().contains("true") {
            return Ok(());
        }

        Err(HostError::Privilege(Guidance::new(
            PRIVILEGE_INSTRUCTION,
            "running without admin privileges",
        )))
    }

    async fn check_hyperv(&self) -> Result<()> {
        // Desktop editions report the feature under Microsoft-Hyper-V-All.
        let desktop = self.feature_state(HYPERV_DESKTOP_FEATURE).await?;
        if desktop.to_lowercase().contains("enabled") {
            return Ok(());
        }

        // Server editions only carry the management module.
        let server = self.feature_state(HYPERV_SERVER_FEATURE).await?;
        if server.to_lowercase().contains("enabled") {
            return Ok(());
        }

        Err(HostError::HypervisorDisabled(Guidance::new(
            HYPERV_DISABLED_INSTRUCTION,
            format!("feature state: {HYPERV_DESKTOP_FEATURE}={desktop:?}, {HYPERV_SERVER_FEATURE}={server:?}"),
        )))
    }

    async fn feature_state(&self, feature: &str) -> Result<String> {
        let command = format!("(Get-WindowsOptionalFeature -FeatureName {feature} -Online).State");
        let output = self
            .powershell
            .output(&command)
            .await
            .map_err(|source| HostError::Command {
                check: "checking whether hyperv is enabled",
                source,
            })?;
        Ok(output.trim().to_string())
    }
}

#[async_trait]
impl Preflight for HypervPreflight {
    async fn check_requirements(&self) -> Result<()> {
        self.check_elevated().await?;
        self.check_hyperv().await
    }
}
