//! Error types for the session layer

use crate::bridge::BridgeError;

/// Result type alias for session operations
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Errors that can occur in the media-session layer
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A native bridge call failed
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Resuming playback after a session update failed
    #[error("playback resume failed: {0}")]
    Playback(String),

    /// Handler used before `configure()` succeeded
    #[error("background handler is not configured")]
    NotConfigured,
}
