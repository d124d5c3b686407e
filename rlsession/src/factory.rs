//! Background-handler factory.
//!
//! This is the one module that imports every platform variant. Variants
//! depend only on the handler contract and the bridge, never on this module,
//! so constructing a handler can never re-enter its own construction path —
//! the dependency graph between contract, variants, and factory runs in one
//! direction only.
//!
//! Construction is infallible by design: when a platform has no usable
//! variant, the factory hands back a [`NullHandler`] and playback proceeds
//! without background controls.

use crate::android::AndroidHandler;
use crate::bridge::NativeBridge;
use crate::handler::{BackgroundHandler, Platform};
use crate::ios::IosHandler;
use crate::null::NullHandler;
use rllink::DeepLinkRouter;
use std::sync::Arc;
use tracing::{info, warn};

/// Detect the platform this process is running on.
pub fn detect_platform() -> Platform {
    if cfg!(target_os = "android") {
        Platform::Android
    } else if cfg!(target_os = "ios") {
        Platform::Ios
    } else {
        Platform::Unsupported
    }
}

/// Build the single background handler for this process.
///
/// Called once at startup; the returned handler is held for the process
/// lifetime and never re-resolved.
pub fn create_handler(
    platform: Platform,
    bridge: Arc<dyn NativeBridge>,
    router: DeepLinkRouter,
) -> Arc<dyn BackgroundHandler> {
    match platform {
        Platform::Android => {
            info!("Using Android background handler");
            Arc::new(AndroidHandler::new(bridge, router))
        }
        Platform::Ios => {
            info!("Using iOS background handler");
            Arc::new(IosHandler::new(bridge, router))
        }
        Platform::Unsupported => {
            warn!("No background handler for this platform, using no-op handler");
            Arc::new(NullHandler::new(router))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::NullBridge;

    fn build(platform: Platform) -> Arc<dyn BackgroundHandler> {
        create_handler(
            platform,
            Arc::new(NullBridge),
            DeepLinkRouter::new("radiolink"),
        )
    }

    #[tokio::test]
    async fn test_factory_builds_each_platform() {
        assert_eq!(build(Platform::Android).platform(), Platform::Android);
        assert_eq!(build(Platform::Ios).platform(), Platform::Ios);
        assert_eq!(
            build(Platform::Unsupported).platform(),
            Platform::Unsupported
        );
    }

    #[tokio::test]
    async fn test_repeated_construction_yields_idempotent_teardown() {
        for platform in [Platform::Android, Platform::Ios, Platform::Unsupported] {
            let handler = build(platform);
            handler.teardown().await.unwrap();
            handler.teardown().await.unwrap();
        }
    }
}
