//! Android background handler.
//!
//! Drives the platform media session and the playback notification through
//! the native bridge: notification channel + media session on `configure`,
//! session activation and intent-filter registration on
//! `register_for_background`. Imports only the handler contract and the
//! bridge; construction happens in [`crate::factory`].

use crate::bridge::NativeBridge;
use crate::error::{Result, SessionError};
use crate::handler::{BackgroundHandler, NowPlayingInfo, Platform, SessionOptions};
use async_trait::async_trait;
use rllink::{DeepLinkRouter, NavigationTarget};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Background handler for Android (MediaSession + foreground service
/// notification).
pub struct AndroidHandler {
    bridge: Arc<dyn NativeBridge>,
    router: DeepLinkRouter,
    configured: AtomicBool,
    torn_down: AtomicBool,
}

impl AndroidHandler {
    pub fn new(bridge: Arc<dyn NativeBridge>, router: DeepLinkRouter) -> Self {
        Self {
            bridge,
            router,
            configured: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BackgroundHandler for AndroidHandler {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    async fn configure(&self, options: &SessionOptions) -> Result<()> {
        self.bridge
            .invoke(
                "notificationChannel.create",
                json!({
                    "channelId": options.channel_id,
                    "name": options.display_name,
                }),
            )
            .await?;
        self.bridge
            .invoke(
                "mediaSession.configure",
                json!({
                    "channelId": options.channel_id,
                    "stationName": options.display_name,
                }),
            )
            .await?;
        self.configured.store(true, Ordering::SeqCst);
        info!(channel = %options.channel_id, "Android media session configured");
        Ok(())
    }

    async fn register_for_background(&self) -> Result<()> {
        if !self.configured.load(Ordering::SeqCst) {
            return Err(SessionError::NotConfigured);
        }
        self.bridge
            .invoke("mediaSession.setActive", json!({ "active": true }))
            .await?;
        self.bridge
            .invoke(
                "intentFilter.register",
                json!({ "scheme": self.router.scheme() }),
            )
            .await?;
        info!("Registered for Android background audio");
        Ok(())
    }

    fn handle_notification_tap(&self, uri: &str) -> NavigationTarget {
        self.router.resolve(uri)
    }

    async fn set_session_enabled(&self, enabled: bool) -> Result<()> {
        self.bridge
            .invoke("mediaNotification.setVisible", json!({ "visible": enabled }))
            .await?;
        Ok(())
    }

    async fn replace_now_playing(&self, info: &NowPlayingInfo) -> Result<()> {
        self.bridge
            .invoke(
                "mediaSession.setMetadata",
                json!({
                    "title": info.title,
                    "artist": info.artist,
                    "artworkUri": info.artwork,
                }),
            )
            .await?;
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            debug!("Android handler already torn down");
            return Ok(());
        }
        self.bridge.invoke("mediaSession.release", json!({})).await?;
        info!("Android media session released");
        Ok(())
    }
}
