//! Stream transport abstraction.
//!
//! The engine never talks HTTP directly; it drives a [`StreamTransport`]
//! which yields a [`StreamConnection`] delivering encoded audio chunks.
//! [`HttpStreamTransport`] is the production implementation; tests inject
//! fakes with controllable latency and failure modes.

use crate::error::{PlayerError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;
use tracing::debug;

/// Default timeout for the initial HTTP response (headers only; the body is
/// an endless live stream)
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "Radiolink/0.1 (rlplayer)";

/// An open live-stream connection delivering encoded audio chunks.
#[async_trait]
pub trait StreamConnection: Send {
    /// Wait for the next chunk of encoded audio.
    ///
    /// Returns `Ok(None)` when the stream ends, which for a live stream is
    /// an abnormal condition the engine maps to its error state.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Factory for live-stream connections.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open the stream at `url`. Resolves once the server has accepted the
    /// request; the first audio chunk arrives through the connection.
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamConnection>>;
}

/// HTTP live-stream transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpStreamTransport {
    client: reqwest::Client,
}

impl HttpStreamTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Create a transport sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamTransport for HttpStreamTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamConnection>> {
        debug!(url, "Opening live stream");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PlayerError::ConnectFailed(format!(
                "stream endpoint returned status {}",
                response.status()
            )));
        }

        Ok(Box::new(HttpStreamConnection {
            stream: Box::pin(response.bytes_stream()),
        }))
    }
}

struct HttpStreamConnection {
    stream: futures::stream::BoxStream<'static, reqwest::Result<Bytes>>,
}

#[async_trait]
impl StreamConnection for HttpStreamConnection {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match self.stream.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(PlayerError::Http(e)),
            None => Ok(None),
        }
    }
}
