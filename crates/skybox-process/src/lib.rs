//! Process drivers for the Skybox VM and virtual network.
//!
//! The drivers translate "start the VM" and "start the network" into
//! supervised background processes, and register the exit watches that turn
//! an unexpected process death into a crash report on the session's channel.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod network;
#[cfg(test)]
mod testing;
pub mod vm;
pub mod watch;

pub use error::{ProcessError, Result};
pub use network::{DynNetworkDriver, NetkitDriver, NetworkDriver, NETKIT_LABEL};
pub use vm::{DynVmDriver, VmDriver, VmkitDriver, VMKIT_LABEL};
pub use watch::{CrashReceiver, CrashSender, WATCH_INTERVAL};
