//! Stream metadata for Radiolink.
//!
//! This crate covers the out-of-band "current song" feed: an HTTP client for
//! the metadata endpoint, the wire models, and the polling loop that diffs
//! consecutive results and forwards changes to the now-playing layer.
//!
//! # Example
//!
//! ```no_run
//! use rlmeta::MetadataClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MetadataClient::builder()
//!         .endpoint("https://stream.example.com/api/now-playing")
//!         .build()?;
//!
//!     let metadata = client.fetch_now_playing().await?;
//!     println!("{} - {}", metadata.track.artist, metadata.track.title);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod poller;

pub use client::{MetadataClient, MetadataClientBuilder, MetadataSource};
pub use error::{Error, Result};
pub use models::{NowPlayingResponse, TrackInfo, TrackMetadata};
pub use poller::{AppLifecycle, MetadataPoller, NowPlayingSink};
