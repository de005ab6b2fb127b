//! Construction of real collaborators from configuration.
//!
//! Commands assemble their orchestrators here so the pieces are always
//! wired the same way: one pidfile supervisor per home directory, drivers
//! sharing it, and socket paths derived from the network state directory.

use crate::session;
use anyhow::Result;
use skybox_core::config::Config;
use skybox_core::{AssetCache, FileTelemetry, TerminalUi};
use skybox_host::{
    DynHostNetwork, DynSupervisor, LoopbackConfigurer, ServiceManager, SkyboxdInstaller,
};
use skybox_platform::ApiClient;
use skybox_process::{CrashSender, NetkitDriver, VmkitDriver};
use std::sync::Arc;

/// Builds the pidfile supervisor for this home directory.
#[must_use]
pub fn supervisor(config: &Config) -> DynSupervisor {
    Arc::new(ServiceManager::new(config.run_dir(), config.log_dir()))
}

/// Builds the loopback alias configurer for the current platform.
#[must_use]
pub fn host_network() -> DynHostNetwork {
    #[cfg(windows)]
    let runner = Arc::new(skybox_host::PowershellRunner::new());
    #[cfg(not(windows))]
    let runner = Arc::new(skybox_host::ShellRunner);
    Arc::new(LoopbackConfigurer::new(runner))
}

/// Opens the persisted telemetry store under the configured home.
///
/// # Errors
///
/// Returns an error if the telemetry state cannot be read or created.
pub fn telemetry(config: &Config) -> Result<Arc<FileTelemetry>> {
    Ok(Arc::new(FileTelemetry::open(config.telemetry_dir())?))
}

/// Assembles the start orchestrator with real collaborators.
///
/// # Errors
///
/// Returns an error if the telemetry store cannot be opened.
pub fn start_command(config: Config, crash_tx: CrashSender) -> Result<session::Start> {
    let supervisor = supervisor(&config);
    let telemetry = telemetry(&config)?;

    let network = NetkitDriver::new(
        supervisor.clone(),
        config.cache_dir(),
        config.network_state_dir(),
    );
    let vm_socket = network.vm_socket();
    let helper_socket = network.helper_socket();

    let vm = VmkitDriver::new(
        supervisor.clone(),
        config.cache_dir(),
        config.state_dir(),
        vm_socket,
        config.vm.clone(),
    );
    let helper = SkyboxdInstaller::new(
        config.cache_dir(),
        config.bin_dir(),
        helper_socket,
        supervisor.clone(),
    );
    let cache = AssetCache::new(config.cache_dir());

    Ok(session::Start {
        config,
        ui: Arc::new(TerminalUi),
        telemetry,
        supervisor,
        hostnet: host_network(),
        cache: Arc::new(cache),
        helper: Arc::new(helper),
        network: Arc::new(network),
        vm: Arc::new(vm),
        platform: Arc::new(ApiClient::new()),
        crash_tx,
    })
}

/// Assembles the stop orchestrator with real collaborators.
///
/// # Errors
///
/// Returns an error if the telemetry store cannot be opened.
pub fn stop_command(config: &Config) -> Result<session::Stop> {
    let supervisor = supervisor(config);
    let telemetry = telemetry(config)?;

    let network = NetkitDriver::new(
        supervisor.clone(),
        config.cache_dir(),
        config.network_state_dir(),
    );
    let vm_socket = network.vm_socket();
    let vm = VmkitDriver::new(
        supervisor.clone(),
        config.cache_dir(),
        config.state_dir(),
        vm_socket,
        config.vm.clone(),
    );

    Ok(session::Stop {
        ui: Arc::new(TerminalUi),
        telemetry,
        vm: Arc::new(vm),
        network: Arc::new(network),
        supervisor,
    })
}
