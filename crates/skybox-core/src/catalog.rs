//! Dependency catalog: the declarative list of assets that must be present
//! in the cache before the VM can boot.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Base URL for released Skybox assets.
const ASSET_BASE_URL: &str = "https://assets.skybox.dev/releases/v0.4.0";

/// A single downloadable asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// File name under the cache directory.
    pub name: String,
    /// Download URL.
    pub url: String,
    /// Expected SHA-256 of the file contents, lower-case hex.
    pub sha256: String,
    /// Expected size in bytes, zero when unknown.
    #[serde(default)]
    pub size: u64,
}

/// Ordered collection of assets.
///
/// Item names are unique within a catalog; [`Catalog::validate`] enforces
/// this and configuration loading rejects catalogs that violate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Assets in download order.
    pub items: Vec<Item>,
}

impl Catalog {
    /// The assets this release needs before `skybox start` can boot the VM.
    #[must_use]
    pub fn builtin() -> Self {
        let item = |name: &str, sha256: &str, size: u64| Item {
            name: name.to_string(),
            url: format!("{ASSET_BASE_URL}/{name}"),
            sha256: sha256.to_string(),
            size,
        };

        Self {
            items: vec![
                item(
                    "vmkit",
                    "9f2b1c6a8d4e07355c1a2f9e8b0d463721aa90c5e4f8d2b7316c5a0e9d84f172",
                    24_117_248,
                ),
                item(
                    "netkit",
                    "4c8e2d91b7a6f0533e9c14d8a2b5e67f019dc3b7a85e24f60d1c79b38a2e5d04",
                    11_534_336,
                ),
                item(
                    "skyboxd",
                    "71d4a9c2e8b5f16309382ddc47a0e5b1f6c28d903e5a417bb2096c8d3f5e1a47",
                    5_242_880,
                ),
                item(
                    "skybox-kernel",
                    "b3e7f2a19c5d48062ea81b7d30c94f5e218a6d0c7f3b9e642591cd8a0b46e713",
                    12_582_912,
                ),
                item(
                    "skybox-rootfs.img",
                    "e50c3b8f7a2d19643cb01e9f582a4d76c38f1b0a92e67d54183c2a9b5d0f64e8",
                    734_003_200,
                ),
            ],
        }
    }

    /// Loads a catalog from a JSON file, typically supplied through the
    /// `SKYBOX_CATALOG_PATH` environment variable.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&content)
            .map_err(|e| CoreError::catalog(format!("{}: {e}", path.display())))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Verifies catalog invariants.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if item.name.is_empty() {
                return Err(CoreError::catalog("item with empty name"));
            }
            if !seen.insert(item.name.as_str()) {
                return Err(CoreError::catalog(format!(
                    "duplicate item name '{}'",
                    item.name
                )));
            }
        }
        Ok(())
    }

    /// Returns true when the catalog holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
