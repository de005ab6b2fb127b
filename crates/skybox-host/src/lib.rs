//! Host integration for Skybox.
//!
//! Everything that touches the machine itself lives here: preflight
//! capability checks, loopback network configuration, supervision of the
//! background services a session is made of, and installation of the
//! skyboxd privileged helper.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod error;
pub mod helper;
pub mod netconf;
pub mod preflight;
pub mod services;

pub use command::{CommandError, CommandRunner, DynCommandRunner, PowershellRunner, ShellRunner};
pub use error::{Guidance, HostError, Result};
pub use helper::{DynHelperInstaller, HelperInstaller, SkyboxdInstaller, SKYBOXD_LABEL};
pub use netconf::{DynHostNetwork, HostNetwork, LoopbackConfigurer};
pub use preflight::{DynPreflight, HypervPreflight, NoopPreflight, Preflight};
pub use services::{DaemonSpec, DynSupervisor, ServiceManager, ServiceSupervisor};
