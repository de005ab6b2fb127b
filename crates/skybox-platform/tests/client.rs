//! Platform client tests against a local mock API server.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use skybox_platform::{ApiClient, PlatformClient, PlatformError, Service};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

async fn serve(app: Router) -> (String, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), server)
}

fn fast_client(base_url: &str) -> ApiClient {
    ApiClient::with_base_url(base_url)
        .with_readiness(Duration::from_secs(5), Duration::from_millis(10))
}

#[tokio::test]
async fn test_ping_retries_until_the_api_answers() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/v1/ping",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::OK
                }
            }
        }),
    );
    let (base_url, server) = serve(app).await;

    fast_client(&base_url).ping().await.unwrap();

    assert!(hits.load(Ordering::SeqCst) >= 3, "two failures then success");
    server.abort();
}

#[tokio::test]
async fn test_ping_gives_up_after_the_deadline() {
    let app = Router::new().route("/v1/ping", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let (base_url, server) = serve(app).await;

    let client = ApiClient::with_base_url(&base_url)
        .with_readiness(Duration::from_millis(100), Duration::from_millis(10));
    let err = client.ping().await.unwrap_err();

    match err {
        PlatformError::Timeout { op, waited } => {
            assert_eq!(op, "waiting for the platform API");
            assert!(waited >= Duration::from_millis(100));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    server.abort();
}

#[tokio::test]
async fn test_ping_keeps_retrying_through_connection_refused() {
    // Bind and immediately drop a listener so the port is known-dead.
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = ApiClient::with_base_url(format!("http://{addr}"))
        .with_readiness(Duration::from_millis(100), Duration::from_millis(10));
    let err = client.ping().await.unwrap_err();

    assert!(matches!(err, PlatformError::Timeout { .. }));
}

#[tokio::test]
async fn test_bootstrap_deployments_hit_their_endpoints() {
    let calls: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let director_calls = calls.clone();
    let platform_calls = calls.clone();
    let app = Router::new()
        .route(
            "/v1/deployments/director",
            post(move |Json(body): Json<Value>| {
                let calls = director_calls.clone();
                async move {
                    calls.lock().unwrap().push(("director".to_string(), body));
                    StatusCode::OK
                }
            }),
        )
        .route(
            "/v1/deployments/platform",
            post(move |Json(body): Json<Value>| {
                let calls = platform_calls.clone();
                async move {
                    calls.lock().unwrap().push(("platform".to_string(), body));
                    StatusCode::OK
                }
            }),
        );
    let (base_url, server) = serve(app).await;
    let client = fast_client(&base_url);

    client.deploy_director().await.unwrap();
    client
        .deploy_platform(&["--verbose".to_string()])
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "director");
    assert_eq!(calls[1].0, "platform");
    assert_eq!(calls[1].1["arguments"], json!(["--verbose"]));
    server.abort();
}

#[tokio::test]
async fn test_services_are_listed_in_order() {
    let app = Router::new().route(
        "/v1/services",
        get(|| async {
            Json(json!([
                {
                    "name": "some-service",
                    "handle": "some-handle",
                    "script": "/path/to/some-script",
                    "deployment": "some-deployment"
                },
                {
                    "name": "some-other-service",
                    "handle": "some-other-handle",
                    "script": "/path/to/some-other-script",
                    "deployment": "some-other-deployment"
                }
            ]))
        }),
    );
    let (base_url, server) = serve(app).await;

    let services = fast_client(&base_url).services().await.unwrap();

    assert_eq!(
        services,
        vec![
            Service {
                name: "some-service".to_string(),
                handle: "some-handle".to_string(),
                script: "/path/to/some-script".to_string(),
                deployment: "some-deployment".to_string(),
            },
            Service {
                name: "some-other-service".to_string(),
                handle: "some-other-handle".to_string(),
                script: "/path/to/some-other-script".to_string(),
                deployment: "some-other-deployment".to_string(),
            },
        ]
    );
    server.abort();
}

#[tokio::test]
async fn test_deploy_service_posts_the_script_to_the_handle() {
    let calls: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let deploy_calls = calls.clone();
    let app = Router::new().route(
        "/v1/services/:handle/deploy",
        post(move |Path(handle): Path<String>, Json(body): Json<Value>| {
            let calls = deploy_calls.clone();
            async move {
                calls.lock().unwrap().push((handle, body));
                StatusCode::OK
            }
        }),
    );
    let (base_url, server) = serve(app).await;

    fast_client(&base_url)
        .deploy_service("some-handle", "/path/to/some-script")
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "some-handle");
    assert_eq!(calls[0].1["script"], "/path/to/some-script");
    server.abort();
}

#[tokio::test]
async fn test_api_failure_surfaces_status_and_body() {
    let app = Router::new().route(
        "/v1/deployments/director",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "director exploded") }),
    );
    let (base_url, server) = serve(app).await;

    let err = fast_client(&base_url).deploy_director().await.unwrap_err();

    match err {
        PlatformError::Api {
            op,
            status,
            message,
        } => {
            assert_eq!(op, "deploying the director");
            assert_eq!(status, 500);
            assert!(message.contains("director exploded"));
        }
        other => panic!("expected Api, got {other:?}"),
    }
    server.abort();
}
