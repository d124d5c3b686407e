//! Host-OS bridge seam.
//!
//! Every call that crosses into native media-session / background-audio APIs
//! goes through [`NativeBridge`]. The hosting application supplies the real
//! implementation (JNI, Swift FFI, embedder callbacks); this crate ships only
//! the no-op [`NullBridge`], and tests inject recording bridges. All bridge
//! calls are asynchronous and awaited by their caller; nothing in this crate
//! fires a native call without awaiting its completion.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// A failed native call, carrying the method name for diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("native bridge call '{method}' failed: {message}")]
pub struct BridgeError {
    pub method: String,
    pub message: String,
}

impl BridgeError {
    pub fn new(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            message: message.into(),
        }
    }
}

/// Asynchronous call surface into the host OS.
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Invoke a named native method with a JSON payload and await its
    /// completion.
    async fn invoke(&self, method: &str, payload: Value) -> Result<Value, BridgeError>;
}

/// Bridge that accepts every call and does nothing.
///
/// Used on platforms without a media-session surface so playback still
/// functions without background controls.
#[derive(Debug, Default, Clone)]
pub struct NullBridge;

#[async_trait]
impl NativeBridge for NullBridge {
    async fn invoke(&self, method: &str, _payload: Value) -> Result<Value, BridgeError> {
        debug!(method, "NullBridge swallowing native call");
        Ok(Value::Null)
    }
}
