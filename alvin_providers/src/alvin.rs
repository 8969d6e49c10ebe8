use std::time::Duration;

use alvin_core::{BatchResponse, Error, LineageApi, QueryObject, Result};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::retry::retry_with_backoff;

pub const API_ENDPOINT: &str = "/api/v1/amundsen-lineage";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub instance_url: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Pause before each retry; empty disables retries.
    pub retry_delays: Vec<Duration>,
    /// Honour `HTTP(S)_PROXY` from the environment.
    pub system_proxy: bool,
}

impl ClientConfig {
    pub fn new(instance_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            retry_delays: vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ],
            system_proxy: true,
        }
    }
}

#[derive(Serialize)]
struct LineageRequest<'a> {
    entities: &'a [QueryObject],
}

/// HTTP client for the Alvin lineage endpoint.
pub struct AlvinClient {
    client: Client,
    endpoint: String,
    api_key: String,
    retry_delays: Vec<Duration>,
}

impl AlvinClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let base = url::Url::parse(&config.instance_url)
            .with_context(|| format!("Invalid Alvin instance URL: {}", config.instance_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("Alvin instance URL must be http or https: {base}");
        }

        let mut builder = Client::builder().timeout(config.timeout);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .context("Failed to create HTTP client")?;

        let endpoint = format!(
            "{}{API_ENDPOINT}",
            config.instance_url.trim_end_matches('/')
        );
        info!("Creating AlvinClient for {endpoint}");

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            retry_delays: config.retry_delays,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Helper method to send a single request
    async fn try_fetch(&self, batch: &[QueryObject]) -> Result<BatchResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&LineageRequest { entities: batch })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // The service answers unknown entities with 404 and a `detail` body.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        debug!("Lineage response: status={status}, bytes={}", body.len());
        Ok(BatchResponse::from_body(&body))
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(e.to_string())
    }
}

#[async_trait]
impl LineageApi for AlvinClient {
    async fn fetch(&self, batch: &[QueryObject]) -> Result<BatchResponse> {
        retry_with_backoff(
            || self.try_fetch(batch),
            &self.retry_delays,
            Error::is_retryable,
        )
        .await
    }
}
