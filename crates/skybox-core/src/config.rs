//! Configuration management.
//!
//! Skybox configuration is loaded from multiple sources with the following
//! priority:
//!
//! 1. Environment variables (SKYBOX_*)
//! 2. User configuration file (~/.config/skybox/config.toml)
//! 3. System configuration file (/etc/skybox/config.toml)
//! 4. Default values
//!
//! ## Example Configuration File
//!
//! ```toml
//! # Skybox configuration file
//! home_dir = "~/.skybox"
//! router_ip = "10.245.0.34"
//! director_ip = "10.245.0.2"
//!
//! [vm]
//! cpus = 4
//! memory_mb = 4096
//! ```

use crate::catalog::Catalog;
use crate::error::{CoreError, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Environment variable naming a JSON file that replaces the built-in
/// dependency catalog.
pub const CATALOG_PATH_VAR: &str = "SKYBOX_CATALOG_PATH";

/// Skybox session configuration.
///
/// Immutable for the lifetime of the session; every component reads from the
/// same loaded value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Home directory holding all session state.
    pub home_dir: PathBuf,
    /// Loopback alias the platform router is reachable on.
    pub router_ip: Ipv4Addr,
    /// Loopback alias the director is reachable on.
    pub director_ip: Ipv4Addr,
    /// Default VM sizing.
    pub vm: VmDefaults,
    /// Assets required before the VM can boot.
    pub catalog: Catalog,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_dir: default_home_dir(),
            router_ip: Ipv4Addr::new(10, 245, 0, 34),
            director_ip: Ipv4Addr::new(10, 245, 0, 2),
            vm: VmDefaults::default(),
            catalog: Catalog::builtin(),
        }
    }
}

impl Config {
    /// Loads configuration from files and environment.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (SKYBOX_*)
    /// 2. User config file (~/.config/skybox/config.toml)
    /// 3. System config file (/etc/skybox/config.toml)
    /// 4. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or the resulting
    /// dependency catalog is invalid.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(system_config_path()))
            .merge(Toml::file(user_config_path()))
            .merge(Env::prefixed("SKYBOX_").split("__"));
        Self::finish(figment)
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SKYBOX_").split("__"));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self> {
        let mut config: Self = figment
            .extract()
            .map_err(|e| CoreError::config(e.to_string()))?;
        if let Ok(path) = std::env::var(CATALOG_PATH_VAR) {
            config.catalog = Catalog::from_file(path)?;
        }
        config.catalog.validate()?;
        Ok(config)
    }

    /// Returns the path to the VM state directory.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.home_dir.join("state")
    }

    /// Returns the path to the virtual-network state directory.
    #[must_use]
    pub fn network_state_dir(&self) -> PathBuf {
        self.home_dir.join("state").join("netkit")
    }

    /// Returns the path to the asset cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.home_dir.join("cache")
    }

    /// Returns the directory installed helper binaries live in.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.home_dir.join("bin")
    }

    /// Returns the directory pidfiles are written to.
    #[must_use]
    pub fn run_dir(&self) -> PathBuf {
        self.home_dir.join("run")
    }

    /// Returns the directory service logs are appended to.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.home_dir.join("log")
    }

    /// Returns the directory telemetry state and events live in.
    #[must_use]
    pub fn telemetry_dir(&self) -> PathBuf {
        self.home_dir.join("telemetry")
    }

    /// Creates every directory the session writes into.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.state_dir(),
            self.network_state_dir(),
            self.cache_dir(),
            self.bin_dir(),
            self.run_dir(),
            self.log_dir(),
            self.telemetry_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Default VM sizing, used when a start invocation passes zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VmDefaults {
    /// Default number of CPUs.
    pub cpus: u32,
    /// Default memory in MB.
    pub memory_mb: u32,
}

impl Default for VmDefaults {
    fn default() -> Self {
        Self {
            cpus: 4,
            memory_mb: 4096,
        }
    }
}

fn default_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join(".skybox")
}

fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("skybox")
        .join("config.toml")
}

fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/skybox/config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.router_ip, Ipv4Addr::new(10, 245, 0, 34));
        assert_eq!(config.director_ip, Ipv4Addr::new(10, 245, 0, 2));
        assert_eq!(config.vm.cpus, 4);
        assert_eq!(config.vm.memory_mb, 4096);
        assert!(!config.catalog.is_empty());
    }

    #[test]
    fn test_config_paths() {
        let config = Config::default();
        assert!(config.state_dir().ends_with("state"));
        assert!(config.network_state_dir().ends_with("state/netkit"));
        assert!(config.cache_dir().ends_with("cache"));
        assert!(config.run_dir().ends_with("run"));
        assert!(config.log_dir().ends_with("log"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
home_dir = "/tmp/skybox-test-home"
router_ip = "10.9.8.7"

[vm]
cpus = 2
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.home_dir, PathBuf::from("/tmp/skybox-test-home"));
        assert_eq!(config.router_ip, Ipv4Addr::new(10, 9, 8, 7));
        assert_eq!(config.director_ip, Ipv4Addr::new(10, 245, 0, 2));
        assert_eq!(config.vm.cpus, 2);
        assert_eq!(config.vm.memory_mb, 4096);
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            home_dir: dir.path().join("home"),
            ..Config::default()
        };

        config.ensure_directories().unwrap();
        assert!(config.cache_dir().is_dir());
        assert!(config.network_state_dir().is_dir());
        assert!(config.run_dir().is_dir());
    }
}
