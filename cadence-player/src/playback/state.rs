//! Playback state owned by the player adapter

use cadence_common::config::PlaybackDefaults;
use cadence_common::events::progress_of;
use cadence_common::{ErrorDescriptor, PlaybackStateMessage, PlaybackStatus, RepeatMode, Track};

/// Authoritative playback snapshot
///
/// Only the [`PlayerAdapter`](super::PlayerAdapter) mutates this. Observers
/// receive it as a [`PlaybackStateMessage`] through the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub current_track: Option<Track>,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub buffered_position_ms: u64,
    /// Always > 0
    pub playback_speed: f32,
    /// Mirrored from the queue
    pub repeat_mode: RepeatMode,
    /// Mirrored from the queue
    pub shuffle_enabled: bool,
    pub last_error: Option<ErrorDescriptor>,
}

impl PlaybackState {
    pub fn new(defaults: &PlaybackDefaults) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            current_track: None,
            position_ms: 0,
            duration_ms: 0,
            buffered_position_ms: 0,
            playback_speed: defaults.speed,
            repeat_mode: defaults.repeat_mode,
            shuffle_enabled: defaults.shuffle,
            last_error: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn to_message(&self) -> PlaybackStateMessage {
        PlaybackStateMessage::from(self)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(&PlaybackDefaults::default())
    }
}

impl From<&PlaybackState> for PlaybackStateMessage {
    fn from(state: &PlaybackState) -> Self {
        let track = state.current_track.as_ref();
        Self {
            is_playing: state.is_playing(),
            media_id: track.map(|t| t.id.to_string()).unwrap_or_default(),
            title: track.map(|t| t.title.clone()).unwrap_or_default(),
            artist: track.map(|t| t.artist.clone()).unwrap_or_default(),
            album_art_uri: track.and_then(|t| t.artwork_uri.clone()).unwrap_or_default(),
            position_ms: state.position_ms as i64,
            duration_ms: state.duration_ms as i64,
            progress: progress_of(state.position_ms, state.duration_ms),
            status: state.status,
            buffered_position_ms: state.buffered_position_ms as i64,
            playback_speed: state.playback_speed,
            repeat_mode: state.repeat_mode,
            shuffle_enabled: state.shuffle_enabled,
            error_message: state
                .last_error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}
