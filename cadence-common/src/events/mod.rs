//! State-change message types
//!
//! `PlaybackStateMessage` is the only payload that crosses from the playback
//! owner to its observers. Field names are part of the wire contract and are
//! serialized in camelCase.

mod playback_types;

pub use playback_types::{EngineErrorKind, ErrorDescriptor, PlaybackStatus, RepeatMode};

use serde::{Deserialize, Serialize};

/// Snapshot of playback state delivered to every observer
///
/// An empty `media_id` means there is no current track. `progress` is
/// `position_ms / duration_ms`, or 0 when the duration is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStateMessage {
    pub is_playing: bool,
    pub media_id: String,
    pub title: String,
    pub artist: String,
    /// "" if the track has no artwork
    pub album_art_uri: String,
    pub position_ms: i64,
    pub duration_ms: i64,
    pub progress: f32,

    pub status: PlaybackStatus,
    pub buffered_position_ms: i64,
    pub playback_speed: f32,
    pub repeat_mode: RepeatMode,
    pub shuffle_enabled: bool,
    /// "" unless `status` is `error`
    pub error_message: String,
}

impl PlaybackStateMessage {
    /// Message describing a player with nothing loaded
    pub fn idle() -> Self {
        Self {
            is_playing: false,
            media_id: String::new(),
            title: String::new(),
            artist: String::new(),
            album_art_uri: String::new(),
            position_ms: 0,
            duration_ms: 0,
            progress: 0.0,
            status: PlaybackStatus::Idle,
            buffered_position_ms: 0,
            playback_speed: 1.0,
            repeat_mode: RepeatMode::Off,
            shuffle_enabled: false,
            error_message: String::new(),
        }
    }

    pub fn has_track(&self) -> bool {
        !self.media_id.is_empty()
    }
}

impl Default for PlaybackStateMessage {
    fn default() -> Self {
        Self::idle()
    }
}

/// Fraction of the track played, 0 when the duration is unknown
pub fn progress_of(position_ms: u64, duration_ms: u64) -> f32 {
    if duration_ms == 0 {
        0.0
    } else {
        (position_ms as f64 / duration_ms as f64) as f32
    }
}
