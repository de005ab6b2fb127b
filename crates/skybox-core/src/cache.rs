//! Asset cache for the dependency catalog.
//!
//! Each catalog item is downloaded into the cache directory, streamed to a
//! `.tmp` sibling first and renamed into place once its SHA-256 matches the
//! catalog entry. Items already present with a matching checksum are left
//! untouched, so `sync` is cheap when the cache is warm.

use crate::catalog::{Catalog, Item};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// HTTP request timeout in seconds.
const HTTP_TIMEOUT_SECS: u64 = 300;

/// Shared handle to a resource cache.
pub type DynCache = Arc<dyn ResourceCache>;

/// Ensures catalog assets are present and verified on disk.
#[async_trait]
pub trait ResourceCache: Send + Sync {
    /// Synchronizes every catalog item into the cache.
    async fn sync(&self, catalog: &Catalog) -> Result<()>;
}

/// Download-and-verify cache backed by a local directory.
pub struct AssetCache {
    cache_dir: PathBuf,
}

impl AssetCache {
    /// Creates a cache rooted at `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn build_http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("skybox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::config(format!("failed to create HTTP client: {e}")))
    }

    /// Whether `item` is already present with a matching checksum.
    async fn verified(&self, item: &Item) -> Result<bool> {
        let path = self.cache_dir.join(&item.name);
        if !path.exists() {
            return Ok(false);
        }
        let actual = compute_file_checksum(&path).await?;
        Ok(actual == item.sha256.to_lowercase())
    }

    async fn fetch(&self, client: &reqwest::Client, item: &Item) -> Result<()> {
        let dest = self.cache_dir.join(&item.name);
        tracing::info!(asset = %item.name, url = %item.url, "downloading asset");

        let response = client.get(&item.url).send().await?;
        if !response.status().is_success() {
            return Err(CoreError::asset(
                &item.name,
                format!("download failed with status {}", response.status()),
            ));
        }

        let temp_path = dest.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        let mut downloaded: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        if item.size > 0 && downloaded != item.size {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CoreError::asset(
                &item.name,
                format!("size mismatch: expected {} bytes, got {downloaded}", item.size),
            ));
        }

        let actual = compute_file_checksum(&temp_path).await?;
        if actual != item.sha256.to_lowercase() {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CoreError::asset(
                &item.name,
                format!("checksum mismatch: expected {}, got {actual}", item.sha256),
            ));
        }

        fs::rename(&temp_path, &dest).await?;
        tracing::debug!(
            asset = %item.name,
            "downloaded {} to {}",
            format_bytes(downloaded),
            dest.display()
        );
        Ok(())
    }
}

#[async_trait]
impl ResourceCache for AssetCache {
    async fn sync(&self, catalog: &Catalog) -> Result<()> {
        catalog.validate()?;
        fs::create_dir_all(&self.cache_dir).await?;

        let client = self.build_http_client()?;
        for item in &catalog.items {
            if self.verified(item).await? {
                tracing::debug!(asset = %item.name, "asset up to date");
                continue;
            }
            self.fetch(&client, item).await?;
        }
        Ok(())
    }
}

/// Computes the SHA-256 checksum of a file as lower-case hex.
pub async fn compute_file_checksum(path: &Path) -> Result<String> {
    let data = fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Formats bytes as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Encodes bytes as hex string.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
