//! Playback engine owning the live-stream connection and the state machine.
//!
//! Commands are serialized; every transition is published on a broadcast
//! channel consumed by the UI layer and by the session layer (which needs to
//! know whether backgrounding is currently meaningful). Connection failures
//! land in [`PlaybackState::Error`] and are *not* retried automatically; the
//! retry decision belongs to the caller.

use crate::error::{PlayerError, Result};
use crate::state::PlaybackState;
use crate::transport::{StreamConnection, StreamTransport};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default bounded window for connect + first audio chunk
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the state-change broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// A single observed state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: PlaybackState,
    pub to: PlaybackState,
}

/// Read/resume surface consumed by the now-playing synchronizer.
///
/// Kept separate from the full engine so downstream crates depend on the
/// narrow contract only.
#[async_trait]
pub trait PlaybackControl: Send + Sync {
    /// Current playback state.
    fn state(&self) -> PlaybackState;

    /// Resume playback; covers OS-driven implicit pauses after a
    /// media-session source swap. No-op when already active.
    async fn resume(&self) -> Result<()>;
}

struct Shared {
    state: RwLock<PlaybackState>,
    events: broadcast::Sender<StateChange>,
}

impl Shared {
    fn state(&self) -> PlaybackState {
        *self.state.read().unwrap()
    }

    /// Single write point for the process-wide playback state.
    fn set_state(&self, to: PlaybackState) {
        let from = {
            let mut guard = self.state.write().unwrap();
            let from = *guard;
            *guard = to;
            from
        };
        if from == to {
            return;
        }
        debug!(from = %from, to = %to, "Playback state changed");
        // Receivers may come and go; a lagging or absent receiver must not
        // block the engine.
        let _ = self.events.send(StateChange { from, to });
    }
}

/// The playback engine.
///
/// Owns the stream connection and is the only writer of [`PlaybackState`].
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct PlaybackEngine {
    stream_url: String,
    transport: Arc<dyn StreamTransport>,
    connect_timeout: Duration,
    shared: Arc<Shared>,
    /// Serializes commands and holds the drain task for the live connection.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackEngine {
    /// Create an engine bound to one live stream URL.
    pub fn new(
        stream_url: impl Into<String>,
        transport: Arc<dyn StreamTransport>,
        connect_timeout: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            stream_url: stream_url.into(),
            transport,
            connect_timeout,
            shared: Arc::new(Shared {
                state: RwLock::new(PlaybackState::Stopped),
                events,
            }),
            task: Mutex::new(None),
        }
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    /// Subscribe to state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.shared.events.subscribe()
    }

    /// The stream URL this engine is bound to.
    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    /// Start (or resume) playback.
    ///
    /// Legal from `Stopped`, `Error`, and `Paused`; a no-op when already
    /// `Playing` or `Buffering`. Transitions to `Buffering`, then to
    /// `Playing` once the stream delivers its first audio chunk, or to
    /// `Error` if that does not happen within the bounded connect timeout.
    pub async fn play(&self) -> Result<()> {
        let mut task = self.task.lock().await;

        let current = self.shared.state();
        if current.is_active() {
            debug!(state = %current, "play() ignored, already active");
            return Ok(());
        }

        Self::abort_task(&mut task);
        self.shared.set_state(PlaybackState::Buffering);
        info!(url = %self.stream_url, "Starting live stream");

        let connection = match tokio::time::timeout(
            self.connect_timeout,
            self.open_and_wait_first_chunk(),
        )
        .await
        {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                warn!(error = %e, "Stream failed to start");
                self.shared.set_state(PlaybackState::Error);
                return Err(e);
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "Stream did not start within the connect timeout"
                );
                self.shared.set_state(PlaybackState::Error);
                return Err(PlayerError::ConnectTimeout {
                    timeout_ms: self.connect_timeout.as_millis() as u64,
                });
            }
        };

        self.shared.set_state(PlaybackState::Playing);
        *task = Some(tokio::spawn(drain_stream(
            connection,
            Arc::clone(&self.shared),
        )));
        Ok(())
    }

    /// Pause playback. Legal only from `Playing` or `Buffering`.
    ///
    /// The live connection is released; resuming reconnects through
    /// `Buffering`.
    pub async fn pause(&self) -> Result<()> {
        let mut task = self.task.lock().await;

        let current = self.shared.state();
        if !current.is_active() {
            return Err(PlayerError::IllegalTransition {
                command: "pause",
                from: current,
            });
        }

        Self::abort_task(&mut task);
        self.shared.set_state(PlaybackState::Paused);
        info!("Playback paused");
        Ok(())
    }

    /// Stop playback. Legal from any state; always lands in `Stopped` and
    /// releases the connection.
    pub async fn stop(&self) -> Result<()> {
        let mut task = self.task.lock().await;
        Self::abort_task(&mut task);
        self.shared.set_state(PlaybackState::Stopped);
        info!("Playback stopped");
        Ok(())
    }

    /// Connect and block until the stream has produced its first chunk,
    /// returning the still-open connection.
    async fn open_and_wait_first_chunk(&self) -> Result<Box<dyn StreamConnection>> {
        let mut connection = self.transport.connect(&self.stream_url).await?;
        match connection.next_chunk().await? {
            Some(_) => Ok(connection),
            None => Err(PlayerError::EmptyStream),
        }
    }

    fn abort_task(task: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

/// Keep pulling chunks so the connection stays alive. A live stream that
/// ends or errors while we are playing is a failure, not a completion.
async fn drain_stream(mut connection: Box<dyn StreamConnection>, shared: Arc<Shared>) {
    loop {
        match connection.next_chunk().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!("Live stream ended unexpectedly");
                if shared.state() == PlaybackState::Playing {
                    shared.set_state(PlaybackState::Error);
                }
                return;
            }
            Err(e) => {
                warn!(error = %e, "Live stream dropped");
                if shared.state() == PlaybackState::Playing {
                    shared.set_state(PlaybackState::Error);
                }
                return;
            }
        }
    }
}

#[async_trait]
impl PlaybackControl for PlaybackEngine {
    fn state(&self) -> PlaybackState {
        self.state()
    }

    async fn resume(&self) -> Result<()> {
        self.play().await
    }
}
