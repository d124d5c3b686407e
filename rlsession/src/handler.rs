//! Platform-neutral background-handler contract.
//!
//! One [`BackgroundHandler`] instance exists per process. It is constructed
//! through [`crate::factory`] at startup and held for the process lifetime;
//! it is never re-resolved per call. Variants implement this trait and import
//! nothing but this module and [`crate::bridge`] — the dependency between a
//! variant and the code that constructs it runs in one direction only.

use crate::error::Result;
use async_trait::async_trait;
use rllink::NavigationTarget;

/// Target platform of the hosting application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    /// Anything without a native media-session surface.
    Unsupported,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Startup options for the native session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Android notification channel identifier
    pub channel_id: String,
    /// Station name shown on the native surface
    pub display_name: String,
    /// Deep-link scheme registered for notification taps
    pub deep_link_scheme: String,
}

impl SessionOptions {
    pub fn new(
        channel_id: impl Into<String>,
        display_name: impl Into<String>,
        deep_link_scheme: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            display_name: display_name.into(),
            deep_link_scheme: deep_link_scheme.into(),
        }
    }
}

/// One native "now playing" display value.
///
/// Derived fresh for every native update; never shared mutable state, so a
/// poller-driven refresh can never race an explicit play/pause command over
/// the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingInfo {
    pub title: String,
    pub artist: String,
    pub artwork: Option<String>,
}

impl NowPlayingInfo {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        artwork: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            artwork,
        }
    }
}

/// Capability contract for native background audio and media-session access.
///
/// The contract is identical across platforms; only the native registration
/// differs per variant. All methods crossing into the OS are asynchronous and
/// must be awaited before the next dependent step runs.
#[async_trait]
pub trait BackgroundHandler: Send + Sync {
    /// The platform this handler drives.
    fn platform(&self) -> Platform;

    /// One-time native session setup (channels, audio categories).
    async fn configure(&self, options: &SessionOptions) -> Result<()>;

    /// Register with the OS for background audio and notification-tap
    /// callbacks.
    async fn register_for_background(&self) -> Result<()>;

    /// Map an OS notification-tap URI to an in-app navigation target.
    /// Total; unknown URIs land on the player home screen.
    fn handle_notification_tap(&self, uri: &str) -> NavigationTarget;

    /// Show or hide the native "now playing" surface.
    async fn set_session_enabled(&self, enabled: bool) -> Result<()>;

    /// Replace the native now-playing metadata. Completion is awaitable by
    /// the caller; there is deliberately no fire-and-return variant.
    async fn replace_now_playing(&self, info: &NowPlayingInfo) -> Result<()>;

    /// Release native resources. Idempotent; safe to call repeatedly.
    async fn teardown(&self) -> Result<()>;
}
