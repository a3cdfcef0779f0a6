//! Track value type
//!
//! A `Track` is built by whoever assembles the queue (library browser, playlist
//! loader, API client). The playback core only ever clones or references it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable media identifier of a track (library id, media store id, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Immutable description of a playable track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Media identifier
    pub id: TrackId,
    /// Source locator (absolute path, `file://` URI, or path relative to the root folder)
    pub locator: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Duration from the library scan (milliseconds, 0 if unknown)
    #[serde(default)]
    pub duration_ms: u64,
    /// Album art reference
    #[serde(default)]
    pub artwork_uri: Option<String>,
    #[serde(default)]
    pub favorite: bool,
}

impl Track {
    pub fn new(id: impl Into<TrackId>, locator: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
            title: title.into(),
            artist: String::new(),
            album: String::new(),
            duration_ms: 0,
            artwork_uri: None,
            favorite: false,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_artwork(mut self, uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(uri.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_builder() {
        let track = Track::new("42", "/music/a.flac", "Song")
            .with_artist("Artist")
            .with_album("Album")
            .with_duration_ms(180_000)
            .with_artwork("content://art/42");

        assert_eq!(track.id.as_str(), "42");
        assert_eq!(track.artist, "Artist");
        assert_eq!(track.duration_ms, 180_000);
        assert_eq!(track.artwork_uri.as_deref(), Some("content://art/42"));
        assert!(!track.favorite);
    }

    #[test]
    fn test_track_deserialize_minimal() {
        let json = r#"{"id":"7","locator":"a.mp3","title":"Seven"}"#;
        let track: Track = serde_json::from_str(json).unwrap();

        assert_eq!(track.id, TrackId::from("7"));
        assert_eq!(track.duration_ms, 0);
        assert!(track.artwork_uri.is_none());
    }
}
