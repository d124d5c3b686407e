//! Now-playing synchronizer.
//!
//! Applies metadata changes to the native media session with the
//! replace-then-settle-then-resume protocol, strictly sequenced:
//!
//! 1. disable the native "now playing" surface,
//! 2. await the metadata replacement,
//! 3. await a settle delay so the OS finishes tearing down and recreating
//!    its notification surface,
//! 4. re-enable the surface,
//! 5. resume playback when it was active before the swap (some OS versions
//!    implicitly pause on a source replacement).
//!
//! No step starts before the previous one resolved, and updates are
//! serialized: a second update waits until the running protocol finishes.
//! A failed refresh is logged with platform and playback state attached and
//! never reaches the playback engine.

use crate::error::{Result, SessionError};
use crate::handler::{BackgroundHandler, NowPlayingInfo};
use async_trait::async_trait;
use rlmeta::{NowPlayingSink, TrackMetadata};
use rlplayer::PlaybackControl;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Settle delay between the metadata replacement and re-enabling the native
/// surface. Empirically chosen; platform integration testing may tune it,
/// but values below 200 ms have shown truncated notification redraws.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Tunables for the update protocol.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub settle_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Owner of the native now-playing display.
///
/// Each update derives a fresh [`NowPlayingInfo`]; nothing here mutates a
/// shared value in place.
pub struct NowPlayingSynchronizer {
    handler: Arc<dyn BackgroundHandler>,
    playback: Arc<dyn PlaybackControl>,
    settle_delay: Duration,
    /// Serializes protocol runs; a native update never starts while the
    /// replace step of a previous update is still pending.
    update_lock: Mutex<()>,
}

impl NowPlayingSynchronizer {
    pub fn new(
        handler: Arc<dyn BackgroundHandler>,
        playback: Arc<dyn PlaybackControl>,
        options: SyncOptions,
    ) -> Self {
        Self {
            handler,
            playback,
            settle_delay: options.settle_delay,
            update_lock: Mutex::new(()),
        }
    }

    /// Update the native now-playing display.
    ///
    /// Never returns an error: a failed metadata refresh must never stop
    /// audio playback.
    pub async fn update_now_playing(&self, info: NowPlayingInfo) {
        let _guard = self.update_lock.lock().await;

        debug!(title = %info.title, artist = %info.artist, "Applying now-playing update");
        if let Err(e) = self.run_protocol(&info).await {
            error!(
                platform = %self.handler.platform(),
                playback_state = %self.playback.state(),
                error = %e,
                "Now-playing update failed, playback continues"
            );
        }
    }

    async fn run_protocol(&self, info: &NowPlayingInfo) -> Result<()> {
        let was_active = self.playback.state().is_active();

        // 1. Hide the surface so the OS never renders a half-swapped state.
        self.handler.set_session_enabled(false).await?;

        // 2. Awaited replacement; completion must be observable here.
        self.handler.replace_now_playing(info).await?;

        // 3. Let the media-session layer finish recreating its surface.
        tokio::time::sleep(self.settle_delay).await;

        // 4. Show the surface again.
        self.handler.set_session_enabled(true).await?;

        // 5. The source swap can implicitly pause playback on some OS
        //    versions; resume when audio was (or should still be) active.
        if was_active || self.playback.state().is_active() {
            self.playback
                .resume()
                .await
                .map_err(|e| SessionError::Playback(e.to_string()))?;
            info!(title = %info.title, "Now-playing updated, playback resumed");
        } else {
            info!(title = %info.title, "Now-playing updated");
        }

        Ok(())
    }
}

#[async_trait]
impl NowPlayingSink for NowPlayingSynchronizer {
    async fn now_playing_changed(&self, metadata: TrackMetadata) {
        // Fresh value per update, derived from the accepted metadata.
        let info = NowPlayingInfo::new(
            metadata.track.title.clone(),
            metadata.track.artist.clone(),
            metadata.artwork.clone(),
        );
        self.update_now_playing(info).await;
    }
}
