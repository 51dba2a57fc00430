//! pRPC status API client
//!
//! Thin `reqwest` wrapper that turns every response into canonical
//! [`NodeRecord`]s or a classified [`FetchError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::normalize::{normalize_list, normalize_node};
use super::{FetchError, FetchErrorKind, Upstream};
use crate::config::Config;
use crate::models::NodeRecord;

/// Client for the external network-status API
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    nodes_path: String,
    node_path: String,
    retry_attempts: u32,
}

impl UpstreamClient {
    /// Creates a client whose every request carries `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client from the upstream settings in `config`.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(&config.upstream_base_url, config.request_timeout)?
            .with_paths(&config.upstream_nodes_path, &config.upstream_node_path)
            .with_retries(config.retry_attempts))
    }

    /// Wraps an existing HTTP client; default endpoint paths, no retries.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            nodes_path: defaults.upstream_nodes_path,
            node_path: defaults.upstream_node_path,
            retry_attempts: 0,
        }
    }

    pub fn with_paths(mut self, nodes_path: &str, node_path: &str) -> Self {
        self.nodes_path = normalize_path(nodes_path);
        self.node_path = normalize_path(node_path);
        self
    }

    pub fn with_retries(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    fn nodes_url(&self) -> String {
        format!("{}{}", self.base_url, self.nodes_path)
    }

    /// By-id URL with `id` percent-encoded as a single path segment.
    fn node_url(&self, id: &str) -> Result<String, FetchError> {
        if matches!(id.trim(), "" | "." | "..") {
            return Err(FetchError::new(
                FetchErrorKind::Shape,
                format!("refusing to look up node id {id:?}"),
            ));
        }

        let invalid = || {
            FetchError::new(
                FetchErrorKind::Network,
                format!("invalid upstream URL {}{}", self.base_url, self.node_path),
            )
        };
        let mut url = Url::parse(&format!("{}{}", self.base_url, self.node_path))
            .map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|_| invalid())?.push(id);
        Ok(url.into())
    }

    /// GETs `url` and decodes the body as JSON, retrying network and timeout
    /// failures up to `retry_attempts` extra times.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.kind.is_retryable() && attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(url, attempt, "pRPC request failed ({}), retrying", err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_json_once(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "pRPC request");

        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|err| FetchError::from_reqwest(&err))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            return Err(FetchError::http(
                status.as_u16(),
                format!("{} {} from {}", status.as_u16(), reason, url),
            ));
        }
        info!(url, status = status.as_u16(), "pRPC response");

        response.json::<Value>().await.map_err(|err| {
            let mut fetch_err = FetchError::from_reqwest(&err);
            if fetch_err.kind != FetchErrorKind::Timeout {
                fetch_err.kind = FetchErrorKind::Shape;
            }
            fetch_err
        })
    }
}

#[async_trait]
impl Upstream for UpstreamClient {
    async fn fetch_all_nodes(&self) -> Result<Vec<NodeRecord>, FetchError> {
        let body = self.get_json(&self.nodes_url()).await?;
        normalize_list(body)
    }

    async fn fetch_node_by_id(&self, id: &str) -> Result<NodeRecord, FetchError> {
        let body = self.get_json(&self.node_url(id)?).await?;
        if !body.is_object() {
            return Err(FetchError::new(
                FetchErrorKind::Shape,
                "expected a node object for single-node lookup",
            ));
        }
        normalize_node(&body)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
