//! iOS background handler.
//!
//! Drives the AVAudioSession category, the remote command center, and the
//! now-playing info center through the native bridge. Imports only the
//! handler contract and the bridge; construction happens in
//! [`crate::factory`].

use crate::bridge::NativeBridge;
use crate::error::{Result, SessionError};
use crate::handler::{BackgroundHandler, NowPlayingInfo, Platform, SessionOptions};
use async_trait::async_trait;
use rllink::{DeepLinkRouter, NavigationTarget};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Background handler for iOS (AVAudioSession + MPNowPlayingInfoCenter).
pub struct IosHandler {
    bridge: Arc<dyn NativeBridge>,
    router: DeepLinkRouter,
    configured: AtomicBool,
    torn_down: AtomicBool,
}

impl IosHandler {
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
impl BackgroundHandler for IosHandler {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    async fn configure(&self, options: &SessionOptions) -> Result<()> {
        self.bridge
            .invoke(
                "audioSession.setCategory",
                json!({
                    "category": "playback",
                    "stationName": options.display_name,
                }),
            )
            .await?;
        self.configured.store(true, Ordering::SeqCst);
        info!("iOS audio session configured");
        Ok(())
    }

    async fn register_for_background(&self) -> Result<()> {
        if !self.configured.load(Ordering::SeqCst) {
            return Err(SessionError::NotConfigured);
        }
        self.bridge
            .invoke("audioSession.setActive", json!({ "active": true }))
            .await?;
        self.bridge
            .invoke(
                "remoteCommandCenter.register",
                json!({ "scheme": self.router.scheme() }),
            )
            .await?;
        info!("Registered for iOS background audio");
        Ok(())
    }

    fn handle_notification_tap(&self, uri: &str) -> NavigationTarget {
        self.router.resolve(uri)
    }

    async fn set_session_enabled(&self, enabled: bool) -> Result<()> {
        self.bridge
            .invoke(
                "nowPlayingInfoCenter.setEnabled",
                json!({ "enabled": enabled }),
            )
            .await?;
        Ok(())
    }

    async fn replace_now_playing(&self, info: &NowPlayingInfo) -> Result<()> {
        self.bridge
            .invoke(
                "nowPlayingInfoCenter.setMetadata",
                json!({
                    "title": info.title,
                    "artist": info.artist,
                    "artworkUrl": info.artwork,
                }),
            )
            .await?;
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            debug!("iOS handler already torn down");
            return Ok(());
        }
        self.bridge
            .invoke("audioSession.deactivate", json!({}))
            .await?;
        info!("iOS audio session deactivated");
        Ok(())
    }
}
