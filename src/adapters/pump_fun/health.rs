//! Pump.fun Health Checks
//!
//! HTTP probe of the pump.fun API and a connect-only probe of the stream
//! endpoint. Used by the `health` command before starting a watch.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::ports::transport::FeedTransport;

/// Default health endpoint
pub const DEFAULT_HEALTH_URL: &str = "https://pump.fun/api/health";

/// Default probe timeout
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Result of an API health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiHealth {
    pub is_healthy: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP health checker for the pump.fun API
#[derive(Debug, Clone)]
pub struct HealthChecker {
    client: Client,
    api_url: String,
}

impl HealthChecker {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, HealthError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// GET the health endpoint. Network failures are reported as unhealthy,
    /// not as errors.
    pub async fn check_api_health(&self) -> ApiHealth {
        debug!("Checking API health at {}", self.api_url);

        let response = match self
            .client
            .get(&self.api_url)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return ApiHealth {
                    is_healthy: false,
                    message: e.to_string(),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return ApiHealth {
                is_healthy: false,
                message: format!(
                    "Status {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown")
                ),
            };
        }

        let message = match response.json::<HealthBody>().await {
            Ok(body) => body.message,
            Err(e) => {
                debug!("Health body not JSON: {}", e);
                None
            }
        };

        ApiHealth {
            is_healthy: true,
            message: message.unwrap_or_else(|| "API is operating normally".to_string()),
        }
    }
}

/// Check that the stream endpoint accepts a connection within `timeout`.
/// The session is closed immediately.
pub async fn probe_websocket(transport: &dyn FeedTransport, url: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, transport.open(url)).await {
        Ok(Ok(mut session)) => {
            session.close().await;
            info!("Stream endpoint available: {}", url);
            true
        }
        Ok(Err(e)) => {
            debug!("Stream endpoint unavailable: {}", e);
            false
        }
        Err(_) => {
            debug!("Stream probe timed out after {:?}", timeout);
            false
        }
    }
}

/// First reachable url from `urls`, in order
pub async fn find_available_url(
    transport: &dyn FeedTransport,
    urls: &[String],
    timeout: Duration,
) -> Option<String> {
    for url in urls {
        info!("Checking availability of {}...", url);
        if probe_websocket(transport, url, timeout).await {
            return Some(url.clone());
        }
    }
    None
}
