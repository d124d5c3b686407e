//! No-op background handler.
//!
//! Used on platforms without a native media-session surface, and as the
//! factory's fallback when a platform variant cannot be built: playback
//! still works, there are just no background controls. Deep-link resolution
//! keeps working so navigation is never left undefined.

use crate::error::Result;
use crate::handler::{BackgroundHandler, NowPlayingInfo, Platform, SessionOptions};
use async_trait::async_trait;
use rllink::{DeepLinkRouter, NavigationTarget};
use tracing::debug;

/// Handler that accepts every call and touches no native API.
pub struct NullHandler {
    router: DeepLinkRouter,
}

impl NullHandler {
    pub fn new(router: DeepLinkRouter) -> Self {
        Self { router }
    }
}

#[async_trait]
impl BackgroundHandler for NullHandler {
    fn platform(&self) -> Platform {
        Platform::Unsupported
    }

    async fn configure(&self, _options: &SessionOptions) -> Result<()> {
        debug!("NullHandler: configure ignored");
        Ok(())
    }

    async fn register_for_background(&self) -> Result<()> {
        debug!("NullHandler: background registration ignored");
        Ok(())
    }

    fn handle_notification_tap(&self, uri: &str) -> NavigationTarget {
        self.router.resolve(uri)
    }

    async fn set_session_enabled(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    async fn replace_now_playing(&self, _info: &NowPlayingInfo) -> Result<()> {
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        Ok(())
    }
}
