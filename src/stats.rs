//! Sidekiq stats retrieval over HTTP

use crate::config::{Config, Credentials};
use crate::errors::{CheckError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, warn};

/// Counters from the Sidekiq dashboard stats document. Only `dead` is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsSnapshot {
    pub dead: u64,
    #[serde(default)]
    pub processed: Option<u64>,
    #[serde(default)]
    pub failed: Option<u64>,
    #[serde(default)]
    pub busy: Option<u64>,
    #[serde(default)]
    pub processes: Option<u64>,
    #[serde(default)]
    pub enqueued: Option<u64>,
    #[serde(default)]
    pub scheduled: Option<u64>,
    #[serde(default)]
    pub retries: Option<u64>,
    #[serde(default)]
    pub default_latency: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatsDocument {
    sidekiq: StatsSnapshot,
}

impl StatsSnapshot {
    pub fn new(dead: u64) -> Self {
        Self {
            dead,
            processed: None,
            failed: None,
            busy: None,
            processes: None,
            enqueued: None,
            scheduled: None,
            retries: None,
            default_latency: None,
        }
    }

    /// Parse the `{"sidekiq": {...}}` document served by the dashboard
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: StatsDocument = serde_json::from_slice(bytes)?;
        Ok(document.sidekiq)
    }
}

/// Fetches the raw stats document
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    async fn fetch(&self, url: &str, auth: Option<&Credentials>) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpStatsFetcher {
    client: Client,
}

impl HttpStatsFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(format!("sidekiq_dead_check/{}", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(CheckError::Http)?;
        Ok(Self { client })
    }

    async fn handle_response(&self, url: &str, response: Response) -> Result<Vec<u8>> {
        let status = response.status();

        if !status.is_success() {
            warn!("Stats endpoint {} answered {}", url, status);
            return Err(CheckError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(CheckError::Http)?;
        debug!("Received {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

#[async_trait]
impl StatsFetcher for HttpStatsFetcher {
    async fn fetch(&self, url: &str, auth: Option<&Credentials>) -> Result<Vec<u8>> {
        debug!("Fetching Sidekiq stats from {}", url);

        let mut request = self.client.get(url);
        if let Some(creds) = auth {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await.map_err(CheckError::Http)?;
        self.handle_response(url, response).await
    }
}
