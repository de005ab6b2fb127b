//! Client for the platform orchestration API.
//!
//! Once the VM is up, the platform inside it serves a small JSON API that
//! the CLI uses to finish bootstrapping: wait for readiness, deploy the
//! director and the platform, then deploy each advertised service.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;

pub use client::{ApiClient, DynPlatformClient, PlatformClient, Service, DEFAULT_BASE_URL};
pub use error::{PlatformError, Result};
