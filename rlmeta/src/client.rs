//! HTTP client for the "current song" endpoint.
//!
//! The client is stateless and fetches one JSON document per call. Change
//! detection and scheduling live in [`crate::poller`]; caching, when wanted,
//! belongs to higher layers.

use crate::error::{Error, Result};
use crate::models::{NowPlayingResponse, TrackMetadata};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default timeout for metadata requests (must stay below the poll interval)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "Radiolink/0.1 (rlmeta)";

/// Source of current-song metadata.
///
/// Abstracts [`MetadataClient`] so the poller can be exercised against
/// deterministic fakes.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the current song.
    async fn now_playing(&self) -> Result<TrackMetadata>;
}

/// HTTP metadata client
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl MetadataClient {
    /// Create a builder for configuring the client
    pub fn builder() -> MetadataClientBuilder {
        MetadataClientBuilder::default()
    }

    /// The endpoint this client polls
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch and parse the current-song document.
    pub async fn fetch_now_playing(&self) -> Result<TrackMetadata> {
        debug!(endpoint = %self.endpoint, "Fetching now-playing metadata");

        let response = self
            .client
            .get(self.endpoint.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::api_error(format!(
                "metadata endpoint returned status {}",
                response.status()
            )));
        }

        let parsed: NowPlayingResponse = response.json().await?;
        let metadata = parsed.into_metadata();

        debug!(track = %metadata.track, "Received now-playing metadata");
        Ok(metadata)
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn now_playing(&self) -> Result<TrackMetadata> {
        self.fetch_now_playing().await
    }
}

/// Builder for configuring a MetadataClient
#[derive(Debug)]
pub struct MetadataClientBuilder {
    client: Option<Client>,
    endpoint: Option<String>,
    timeout: Duration,
    user_agent: String,
}

impl Default for MetadataClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            endpoint: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl MetadataClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client (shares connection pools)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the metadata endpoint URL (required)
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<MetadataClient> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::other("metadata endpoint is required"))?;
        let endpoint = Url::parse(&endpoint)?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()?,
        };

        Ok(MetadataClient {
            client,
            endpoint,
            timeout: self.timeout,
        })
    }
}
