//! Native media-session layer for Radiolink.
//!
//! Wraps the per-platform background-audio surface (media session,
//! lock-screen controls, notification taps) behind one capability contract,
//! and keeps the native "now playing" display in sync with the out-of-band
//! metadata feed without ever interrupting audio.
//!
//! Module roles:
//! - [`handler`] — the platform-neutral capability contract and its types.
//! - [`bridge`] — the host-OS FFI seam every variant talks through.
//! - [`android`] / [`ios`] / [`null`] — one concrete variant per platform;
//!   each depends only on the contract and the bridge.
//! - [`factory`] — the single module that knows every variant and builds
//!   the one handler instance a process gets.
//! - [`sync`] — the replace-then-settle-then-resume update protocol.

pub mod android;
pub mod bridge;
pub mod error;
pub mod factory;
pub mod handler;
pub mod ios;
pub mod null;
pub mod sync;

pub use bridge::{BridgeError, NativeBridge, NullBridge};
pub use error::{Result, SessionError};
pub use factory::{create_handler, detect_platform};
pub use handler::{BackgroundHandler, NowPlayingInfo, Platform, SessionOptions};
pub use sync::{NowPlayingSynchronizer, SyncOptions};
