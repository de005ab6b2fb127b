//! Session lifecycle orchestration.
//!
//! [`Start`] turns a cold machine into a running platform through a strict
//! sequence of collaborator calls; [`Stop`] tears the session down again.
//! Both hold their collaborators as injected trait handles, so the sequences
//! are verified end to end against recording fakes.

use anyhow::Result;
use serde_json::Value;
use skybox_core::config::Config;
use skybox_core::telemetry::{self, DynTelemetry};
use skybox_core::{DynCache, DynUi};
use skybox_host::{DynHelperInstaller, DynHostNetwork, DynSupervisor, SKYBOXD_LABEL};
use skybox_platform::DynPlatformClient;
use skybox_process::{CrashSender, DynNetworkDriver, DynVmDriver, VMKIT_LABEL};

/// VM sizing for one start invocation. Zero selects the configured default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartArgs {
    pub cpus: u32,
    pub memory_mb: u32,
}

/// The start orchestrator.
///
/// Fields are public so tests can assemble one from fakes the same way the
/// wiring assembles one from real collaborators.
pub struct Start {
    pub config: Config,
    pub ui: DynUi,
    pub telemetry: DynTelemetry,
    pub supervisor: DynSupervisor,
    pub hostnet: DynHostNetwork,
    pub cache: DynCache,
    pub helper: DynHelperInstaller,
    pub network: DynNetworkDriver,
    pub vm: DynVmDriver,
    pub platform: DynPlatformClient,
    pub crash_tx: CrashSender,
}

impl Start {
    /// Runs the bring-up sequence.
    ///
    /// Any collaborator failure aborts the sequence and propagates
    /// unchanged; processes already started stay up and are reported by
    /// their exit watches or torn down by `skybox stop`.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator error encountered.
    pub async fn execute(&self, args: StartArgs) -> Result<()> {
        self.telemetry.set_prop("type", "sky");
        self.telemetry.event(telemetry::START_BEGIN, &[]);

        if self.supervisor.is_running(VMKIT_LABEL)? {
            self.ui.say("Skybox is already running...");
            self.telemetry
                .event(telemetry::START_END, &[("alreadyrunning", Value::Bool(true))]);
            return Ok(());
        }

        self.hostnet
            .add_loopback_aliases(self.config.director_ip, self.config.router_ip)
            .await?;

        self.ui.say("Downloading resources...");
        self.cache.sync(&self.config.catalog).await?;

        self.ui.say("Installing skyboxd network helper...");
        self.helper.install().await?;

        self.ui.say("Starting the virtual network...");
        self.network.start().await?;
        self.network.watch(self.crash_tx.clone())?;

        self.ui.say("Starting the VM...");
        self.vm.start(args.cpus, args.memory_mb).await?;
        self.vm.watch(self.crash_tx.clone())?;

        self.ui.say("Waiting for the platform API...");
        self.platform.ping().await?;

        self.ui.say("Deploying the director...");
        self.platform.deploy_director().await?;

        self.ui.say("Deploying the platform...");
        self.platform.deploy_platform(&[]).await?;

        let services = self.platform.services().await?;
        for service in &services {
            self.ui.say(&format!("Deploying {}...", service.name));
            self.platform
                .deploy_service(&service.handle, &service.script)
                .await?;
        }

        self.ui.say(&self.welcome());
        self.telemetry.event(telemetry::START_END, &[]);
        Ok(())
    }

    fn welcome(&self) -> String {
        format!(
            "\nSkybox is ready!\n\n\
             The platform API is forwarded to {api}\n\
             The router answers at {router} and the director at {director}\n",
            api = skybox_platform::DEFAULT_BASE_URL,
            router = self.config.router_ip,
            director = self.config.director_ip,
        )
    }
}

/// The stop orchestrator.
pub struct Stop {
    pub ui: DynUi,
    pub telemetry: DynTelemetry,
    pub vm: DynVmDriver,
    pub network: DynNetworkDriver,
    pub supervisor: DynSupervisor,
}

impl Stop {
    /// Stops the VM, the network relay, and the privileged helper.
    ///
    /// Services that are not running are skipped silently, so stopping an
    /// already-stopped session succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator error encountered.
    pub async fn execute(&self) -> Result<()> {
        self.telemetry.event(telemetry::STOP, &[]);
        self.ui.say("Stopping Skybox...");

        self.vm.stop().await?;
        self.network.stop().await?;
        self.supervisor.stop(SKYBOXD_LABEL).await?;

        self.ui.say("Skybox is stopped.");
        Ok(())
    }
}
