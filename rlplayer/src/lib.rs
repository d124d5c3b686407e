//! Audio playback engine for Radiolink.
//!
//! This crate owns the live-stream connection and the playback state machine.
//! It exposes three commands (`play`, `pause`, `stop`), a readable state, and
//! a broadcast stream of state-change events. All state writes happen here;
//! every other component reads through accessors.
//!
//! The actual byte transport sits behind the [`StreamTransport`] trait so the
//! engine can be driven against fakes in tests and against HTTP in the app.

pub mod engine;
pub mod error;
pub mod state;
pub mod transport;

pub use engine::{PlaybackControl, PlaybackEngine, StateChange};
pub use error::{PlayerError, Result};
pub use state::PlaybackState;
pub use transport::{HttpStreamTransport, StreamConnection, StreamTransport};
