//! # skybox-core
//!
//! Shared foundation for Skybox: session configuration, the dependency
//! catalog and asset cache, progress reporting, and telemetry.
//!
//! Everything the session orchestrator consumes from this crate is exposed
//! behind a narrow trait ([`ResourceCache`], [`Ui`], [`Telemetry`]) so the
//! orchestrator can be exercised with test doubles; the concrete
//! implementations ([`AssetCache`], [`TerminalUi`], [`FileTelemetry`]) are
//! what the CLI wires in.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod progress;
pub mod telemetry;

pub use cache::{AssetCache, DynCache, ResourceCache};
pub use catalog::{Catalog, Item};
pub use config::Config;
pub use error::{CoreError, Result};
pub use progress::{DynUi, TerminalUi, Ui};
pub use telemetry::{DynTelemetry, FileTelemetry, Telemetry};
