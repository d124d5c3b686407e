//! Timed metadata polling loop with change detection.
//!
//! The poller is the only recurring activity in the process. It runs on a
//! fixed interval (never tightened under load), performs at most one fetch
//! per interval, and never lets two fetches overlap: the next fetch is
//! scheduled only after the previous one has completed, and the fetch-level
//! timeout is clamped below the interval.
//!
//! While the app is backgrounded and playback is inactive, the loop stays
//! alive but fetches nothing; the last-accepted value survives the
//! suspension so resuming does not replay an unchanged track.

use crate::client::MetadataSource;
use crate::models::{TrackInfo, TrackMetadata};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default poll interval (production value)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Headroom kept between the fetch timeout and the poll interval
const FETCH_TIMEOUT_MARGIN: Duration = Duration::from_millis(250);

/// Foreground/background position of the hosting app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    Foreground,
    Background,
}

/// Consumer of accepted metadata changes.
///
/// Implemented by the now-playing synchronizer; the poller invokes it only
/// when `{title, artist}` actually changed.
#[async_trait]
pub trait NowPlayingSink: Send + Sync {
    async fn now_playing_changed(&self, metadata: TrackMetadata);
}

struct PollerShared {
    /// Last `{title, artist}` forwarded to the sink. Written only by the
    /// polling loop.
    last_accepted: Mutex<Option<TrackInfo>>,
    lifecycle: Mutex<AppLifecycle>,
    playback_active: AtomicBool,
}

impl PollerShared {
    /// Polling runs while the app is foregrounded or audio is active.
    fn should_poll(&self) -> bool {
        self.playback_active.load(Ordering::SeqCst)
            || *self.lifecycle.lock().unwrap() == AppLifecycle::Foreground
    }
}

/// The metadata polling loop.
pub struct MetadataPoller {
    source: Arc<dyn MetadataSource>,
    sink: Arc<dyn NowPlayingSink>,
    fetch_timeout: Duration,
    shared: Arc<PollerShared>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl MetadataPoller {
    /// Create a poller wiring a metadata source to a now-playing sink.
    pub fn new(
        source: Arc<dyn MetadataSource>,
        sink: Arc<dyn NowPlayingSink>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            fetch_timeout,
            shared: Arc::new(PollerShared {
                last_accepted: Mutex::new(None),
                lifecycle: Mutex::new(AppLifecycle::Foreground),
                playback_active: AtomicBool::new(false),
            }),
            cancel: Mutex::new(None),
        }
    }

    /// Last `{title, artist}` accepted by the loop.
    pub fn last_accepted(&self) -> Option<TrackInfo> {
        self.shared.last_accepted.lock().unwrap().clone()
    }

    /// Record a foreground/background transition of the hosting app.
    pub fn set_lifecycle(&self, lifecycle: AppLifecycle) {
        *self.shared.lifecycle.lock().unwrap() = lifecycle;
        debug!(?lifecycle, "Poller lifecycle input updated");
    }

    /// Record whether playback is currently active.
    pub fn set_playback_active(&self, active: bool) {
        self.shared.playback_active.store(active, Ordering::SeqCst);
        debug!(active, "Poller playback input updated");
    }

    /// Start the polling loop on a fixed interval.
    ///
    /// A second `start` while the loop is running is ignored. The interval is
    /// fixed for the lifetime of the loop; restart to change it.
    pub fn start(&self, interval: Duration) {
        let mut cancel = self.cancel.lock().unwrap();
        if let Some(token) = cancel.as_ref() {
            if !token.is_cancelled() {
                warn!("Metadata poller already running, start() ignored");
                return;
            }
        }

        let token = CancellationToken::new();
        *cancel = Some(token.clone());

        let source = Arc::clone(&self.source);
        let sink = Arc::clone(&self.sink);
        let shared = Arc::clone(&self.shared);
        let fetch_timeout = effective_fetch_timeout(self.fetch_timeout, interval);

        info!(
            interval_ms = interval.as_millis() as u64,
            fetch_timeout_ms = fetch_timeout.as_millis() as u64,
            "Starting metadata poller"
        );

        tokio::spawn(async move {
            poll_loop(source, sink, shared, interval, fetch_timeout, token).await;
        });
    }

    /// Stop the polling loop. Idempotent.
    pub fn stop(&self) {
        let mut cancel = self.cancel.lock().unwrap();
        if let Some(token) = cancel.take() {
            token.cancel();
            info!("Metadata poller stopped");
        }
    }
}

impl Drop for MetadataPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clamp the fetch timeout below the poll interval so a stalled fetch can
/// never spill into the next tick.
fn effective_fetch_timeout(fetch_timeout: Duration, interval: Duration) -> Duration {
    let ceiling = interval.saturating_sub(FETCH_TIMEOUT_MARGIN);
    if ceiling.is_zero() {
        return fetch_timeout;
    }
    fetch_timeout.min(ceiling)
}

async fn poll_loop(
    source: Arc<dyn MetadataSource>,
    sink: Arc<dyn NowPlayingSink>,
    shared: Arc<PollerShared>,
    interval: Duration,
    fetch_timeout: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // A late fetch must cost us the missed ticks, not compress them.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Metadata poll loop cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        if !shared.should_poll() {
            // Backgrounded and silent: skip the fetch entirely, keep state.
            continue;
        }

        let fetched = tokio::time::timeout(fetch_timeout, source.now_playing()).await;
        match fetched {
            Ok(Ok(metadata)) => {
                let changed = {
                    let last = shared.last_accepted.lock().unwrap();
                    last.as_ref() != Some(&metadata.track)
                };
                if changed {
                    info!(track = %metadata.track, "Now-playing metadata changed");
                    sink.now_playing_changed(metadata.clone()).await;
                    *shared.last_accepted.lock().unwrap() = Some(metadata.track);
                } else {
                    debug!(track = %metadata.track, "Metadata unchanged");
                }
            }
            Ok(Err(e)) => {
                // Transient failure: keep the previous value, no state reset.
                warn!(error = %e, "Metadata fetch failed, keeping previous value");
            }
            Err(_) => {
                warn!(
                    timeout_ms = fetch_timeout.as_millis() as u64,
                    "Metadata fetch timed out, skipping this cycle"
                );
            }
        }
    }
}
