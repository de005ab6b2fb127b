//! HTTP client for the platform API.
//!
//! The guest platform exposes its orchestration API inside the VM; the
//! network relay forwards it onto localhost. Everything here is plain JSON
//! over HTTP: a readiness ping with retry, the two bootstrap deployments,
//! and per-service deployment.

use crate::error::{PlatformError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Address the network relay forwards the guest API to.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:9241";

/// How long `ping` keeps retrying before giving up.
const READY_DEADLINE: Duration = Duration::from_secs(300);

/// Pause between readiness probes.
const READY_INTERVAL: Duration = Duration::from_secs(1);

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A deployable service advertised by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Display name.
    pub name: String,
    /// Container handle the deployment runs in.
    pub handle: String,
    /// Path of the deployment script inside the container.
    pub script: String,
    /// Deployment the service belongs to.
    pub deployment: String,
}

/// Shared handle to a platform client.
pub type DynPlatformClient = Arc<dyn PlatformClient>;

/// Operations the CLI performs against the platform API.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Waits until the API answers, retrying until a deadline.
    async fn ping(&self) -> Result<()>;

    /// Deploys the director.
    async fn deploy_director(&self) -> Result<()>;

    /// Deploys the platform itself with optional extra arguments.
    async fn deploy_platform(&self, arguments: &[String]) -> Result<()>;

    /// Lists the deployable services in deployment order.
    async fn services(&self) -> Result<Vec<Service>>;

    /// Runs one service's deployment script in its container.
    async fn deploy_service(&self, handle: &str, script: &str) -> Result<()>;
}

#[derive(Serialize)]
struct PlatformDeployRequest<'a> {
    arguments: &'a [String],
}

#[derive(Serialize)]
struct ServiceDeployRequest<'a> {
    script: &'a str,
}

/// Client for the relay-forwarded platform API.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    ready_deadline: Duration,
    ready_interval: Duration,
}

impl ApiClient {
    /// Creates a client against [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a specific base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: build_http_client(),
            ready_deadline: READY_DEADLINE,
            ready_interval: READY_INTERVAL,
        }
    }

    /// Overrides the readiness deadline and probe interval.
    #[must_use]
    pub const fn with_readiness(mut self, deadline: Duration, interval: Duration) -> Self {
        self.ready_deadline = deadline;
        self.ready_interval = interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        op: &'static str,
        path: &str,
    ) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|err| self.classify(err))?;
        let response = self.check_status(op, response).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize>(&self, op: &'static str, path: &str, body: &B) -> Result<()> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| self.classify(err))?;
        self.check_status(op, response).await?;
        Ok(())
    }

    async fn check_status(
        &self,
        op: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(PlatformError::Api {
            op,
            status: status.as_u16(),
            message,
        })
    }

    fn classify(&self, err: reqwest::Error) -> PlatformError {
        if err.is_connect() {
            PlatformError::Unreachable {
                base_url: self.base_url.clone(),
                reason: err.to_string(),
            }
        } else {
            PlatformError::Http(err)
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformClient for ApiClient {
    async fn ping(&self) -> Result<()> {
        let started = Instant::now();
        loop {
            match self.http.get(self.url("/v1/ping")).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(waited = ?started.elapsed(), "platform API is ready");
                    return Ok(());
                }
                Ok(response) => {
                    debug!(status = %response.status(), "platform API not ready yet");
                }
                Err(err) => {
                    debug!(error = %err, "platform API not reachable yet");
                }
            }
            if started.elapsed() >= self.ready_deadline {
                return Err(PlatformError::Timeout {
                    op: "waiting for the platform API",
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.ready_interval).await;
        }
    }

    async fn deploy_director(&self) -> Result<()> {
        self.post(
            "deploying the director",
            "/v1/deployments/director",
            &serde_json::json!({}),
        )
        .await
    }

    async fn deploy_platform(&self, arguments: &[String]) -> Result<()> {
        self.post(
            "deploying the platform",
            "/v1/deployments/platform",
            &PlatformDeployRequest { arguments },
        )
        .await
    }

    async fn services(&self) -> Result<Vec<Service>> {
        self.get_json("listing services", "/v1/services").await
    }

    async fn deploy_service(&self, handle: &str, script: &str) -> Result<()> {
        self.post(
            "deploying a service",
            &format!("/v1/services/{handle}/deploy"),
            &ServiceDeployRequest { script },
        )
        .await
    }
}

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("skybox/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to create HTTP client")
}
