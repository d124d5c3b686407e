//! Wire models for the "current song" endpoint.

use serde::{Deserialize, Serialize};

/// The `{title, artist}` pair the poller diffs on.
///
/// Structural equality of this value is the change-detection criterion;
/// artwork updates alone never trigger a now-playing refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
}

impl TrackInfo {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

impl std::fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Everything the metadata endpoint knows about the current song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Title/artist pair used for change detection
    pub track: TrackInfo,
    /// Optional cover artwork URL
    pub artwork: Option<String>,
}

/// Raw JSON response of the "current song" endpoint.
///
/// The endpoint guarantees `title` and `artist`; everything else is
/// best-effort and tolerated when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowPlayingResponse {
    pub title: String,
    pub artist: String,
    /// Cover artwork URL; some backends call it `cover`, others `artwork`
    #[serde(default, alias = "artwork")]
    pub cover: Option<String>,
    /// Track duration in seconds, when the backend knows it
    #[serde(default)]
    pub duration: Option<u64>,
}

impl NowPlayingResponse {
    /// Convert the wire response into the internal metadata value.
    ///
    /// Whitespace around title and artist is trimmed so cosmetic feed
    /// differences do not register as track changes.
    pub fn into_metadata(self) -> TrackMetadata {
        TrackMetadata {
            track: TrackInfo::new(self.title.trim(), self.artist.trim()),
            artwork: self.cover.filter(|c| !c.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_response() {
        let response: NowPlayingResponse =
            serde_json::from_str(r#"{"title": "So What", "artist": "Miles Davis"}"#).unwrap();
        let metadata = response.into_metadata();
        assert_eq!(metadata.track, TrackInfo::new("So What", "Miles Davis"));
        assert_eq!(metadata.artwork, None);
    }

    #[test]
    fn test_artwork_alias_and_empty_cover() {
        let response: NowPlayingResponse = serde_json::from_str(
            r#"{"title": "T", "artist": "A", "artwork": "https://img.example/c.jpg"}"#,
        )
        .unwrap();
        assert_eq!(
            response.into_metadata().artwork.as_deref(),
            Some("https://img.example/c.jpg")
        );

        let response: NowPlayingResponse =
            serde_json::from_str(r#"{"title": "T", "artist": "A", "cover": ""}"#).unwrap();
        assert_eq!(response.into_metadata().artwork, None);
    }

    #[test]
    fn test_trimming_does_not_create_spurious_changes() {
        let a: NowPlayingResponse =
            serde_json::from_str(r#"{"title": "So What ", "artist": "Miles Davis"}"#).unwrap();
        let b: NowPlayingResponse =
            serde_json::from_str(r#"{"title": "So What", "artist": " Miles Davis"}"#).unwrap();
        assert_eq!(a.into_metadata().track, b.into_metadata().track);
    }
}
