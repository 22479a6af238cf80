//! Remote API boundary
//!
//! The fetcher only ever sees `Transport`; the reqwest implementation is
//! the production one, tests substitute deterministic backends.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::params::RemoteRequest;
use crate::error::{ApiError, Result};

/// Public VocaDB API root
pub const DEFAULT_BASE_URL: &str = "https://vocadb.net/api";

// == Transport Trait ==
/// Performs a GET and hands back the decoded JSON body.
///
/// Implementations must fail with `ApiError::RemoteService` on a non-2xx
/// status and never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, request: &RemoteRequest) -> Result<Value>;
}

// == HTTP Transport ==
/// reqwest-backed transport against a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a transport with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, request: &RemoteRequest) -> String {
        format!("{}/{}", self.base_url, request.path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, request: &RemoteRequest) -> Result<Value> {
        let url = self.url_for(request);
        debug!(url = %url, params = ?request.query, "requesting");

        let response = self.client.get(&url).query(&request.query).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "remote service returned an error");
            return Err(ApiError::RemoteService {
                status_code: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
