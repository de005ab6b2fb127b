//! Asset cache tests against a local HTTP server.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use skybox_core::catalog::{Catalog, Item};
use skybox_core::{AssetCache, ResourceCache};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const VMKIT_SHA256: &str = "b37f12ef2bfec3b0e47e906980b849114f2477f2799df5b6580810837bfe83a7";
const NETKIT_SHA256: &str = "1191417770a5ffac4c325482b27aa2d0a42ba52704301d628f0dfd572a840f05";

#[derive(Clone, Default)]
struct Assets {
    files: Arc<HashMap<String, Vec<u8>>>,
    hits: Arc<AtomicUsize>,
}

async fn serve_asset(
    State(assets): State<Assets>,
    Path(name): Path<String>,
) -> Result<Vec<u8>, StatusCode> {
    assets.hits.fetch_add(1, Ordering::SeqCst);
    assets.files.get(&name).cloned().ok_or(StatusCode::NOT_FOUND)
}

async fn serve(assets: Assets) -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/assets/:name", get(serve_asset))
        .with_state(assets);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), server)
}

fn assets(files: &[(&str, &[u8])]) -> Assets {
    Assets {
        files: Arc::new(
            files
                .iter()
                .map(|(name, bytes)| ((*name).to_string(), bytes.to_vec()))
                .collect(),
        ),
        hits: Arc::new(AtomicUsize::new(0)),
    }
}

fn item(base_url: &str, name: &str, sha256: &str, size: u64) -> Item {
    Item {
        name: name.to_string(),
        url: format!("{base_url}/assets/{name}"),
        sha256: sha256.to_string(),
        size,
    }
}

#[tokio::test]
async fn test_sync_downloads_missing_assets() {
    let assets = assets(&[
        ("vmkit", b"vmkit payload"),
        ("netkit", b"netkit payload"),
    ]);
    let (base_url, server) = serve(assets).await;
    let tmp = TempDir::new().unwrap();
    let cache = AssetCache::new(tmp.path());

    let catalog = Catalog {
        items: vec![
            item(&base_url, "vmkit", VMKIT_SHA256, 13),
            item(&base_url, "netkit", NETKIT_SHA256, 0),
        ],
    };
    cache.sync(&catalog).await.unwrap();

    assert_eq!(std::fs::read(tmp.path().join("vmkit")).unwrap(), b"vmkit payload");
    assert_eq!(std::fs::read(tmp.path().join("netkit")).unwrap(), b"netkit payload");
    assert!(!tmp.path().join("vmkit.tmp").exists());
    server.abort();
}

#[tokio::test]
async fn test_sync_skips_assets_already_verified() {
    let assets = assets(&[("vmkit", b"vmkit payload")]);
    let hits = assets.hits.clone();
    let (base_url, server) = serve(assets).await;
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("vmkit"), b"vmkit payload").unwrap();
    let cache = AssetCache::new(tmp.path());

    let catalog = Catalog {
        items: vec![item(&base_url, "vmkit", VMKIT_SHA256, 13)],
    };
    cache.sync(&catalog).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 0, "warm asset must not be fetched");
    server.abort();
}

#[tokio::test]
async fn test_sync_replaces_a_corrupt_cached_asset() {
    let assets = assets(&[("vmkit", b"vmkit payload")]);
    let (base_url, server) = serve(assets).await;
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("vmkit"), b"stale bytes").unwrap();
    let cache = AssetCache::new(tmp.path());

    let catalog = Catalog {
        items: vec![item(&base_url, "vmkit", VMKIT_SHA256, 13)],
    };
    cache.sync(&catalog).await.unwrap();

    assert_eq!(std::fs::read(tmp.path().join("vmkit")).unwrap(), b"vmkit payload");
    server.abort();
}

#[tokio::test]
async fn test_sync_rejects_a_checksum_mismatch() {
    let assets = assets(&[("vmkit", b"vmkit payload")]);
    let (base_url, server) = serve(assets).await;
    let tmp = TempDir::new().unwrap();
    let cache = AssetCache::new(tmp.path());

    let catalog = Catalog {
        items: vec![item(&base_url, "vmkit", NETKIT_SHA256, 0)],
    };
    let err = cache.sync(&catalog).await.unwrap_err();

    assert!(err.to_string().contains("checksum mismatch"), "{err}");
    assert!(!tmp.path().join("vmkit").exists());
    assert!(!tmp.path().join("vmkit.tmp").exists());
    server.abort();
}

#[tokio::test]
async fn test_sync_rejects_a_size_mismatch() {
    let assets = assets(&[("vmkit", b"vmkit payload")]);
    let (base_url, server) = serve(assets).await;
    let tmp = TempDir::new().unwrap();
    let cache = AssetCache::new(tmp.path());

    let catalog = Catalog {
        items: vec![item(&base_url, "vmkit", VMKIT_SHA256, 99)],
    };
    let err = cache.sync(&catalog).await.unwrap_err();

    assert!(err.to_string().contains("size mismatch"), "{err}");
    assert!(!tmp.path().join("vmkit").exists());
    server.abort();
}

#[tokio::test]
async fn test_sync_surfaces_download_failures() {
    let assets = assets(&[]);
    let (base_url, server) = serve(assets).await;
    let tmp = TempDir::new().unwrap();
    let cache = AssetCache::new(tmp.path());

    let catalog = Catalog {
        items: vec![item(&base_url, "vmkit", VMKIT_SHA256, 0)],
    };
    let err = cache.sync(&catalog).await.unwrap_err();

    assert!(err.to_string().contains("download failed with status"), "{err}");
    server.abort();
}
