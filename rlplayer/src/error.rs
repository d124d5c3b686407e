//! Error types for the playback engine

use crate::state::PlaybackState;

/// Result type alias for playback operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors that can occur when driving the playback engine
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Command is not legal from the current state
    #[error("'{command}' is not legal from state {from}")]
    IllegalTransition {
        command: &'static str,
        from: PlaybackState,
    },

    /// Stream failed to connect or buffer within the bounded timeout
    #[error("stream did not start within {timeout_ms} ms")]
    ConnectTimeout { timeout_ms: u64 },

    /// Stream connection failed outright
    #[error("stream connection failed: {0}")]
    ConnectFailed(String),

    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stream ended before delivering any audio
    #[error("stream ended before the first audio chunk")]
    EmptyStream,
}
