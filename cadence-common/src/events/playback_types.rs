//! Playback-related type definitions
//!
//! Supporting types for the playback state machine and its error reporting.

use serde::{Deserialize, Serialize};

/// Playback status of the player state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing loaded, or stopped/released
    #[default]
    Idle,
    /// Engine is preparing the current track in the background
    Preparing,
    /// Prepared and paused at the start, waiting for play
    Ready,
    Playing,
    Paused,
    /// Queue finished with nothing left to play
    Ended,
    /// The current track failed; the queue stays navigable
    Error,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Preparing => write!(f, "preparing"),
            PlaybackStatus::Ready => write!(f, "ready"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Ended => write!(f, "ended"),
            PlaybackStatus::Error => write!(f, "error"),
        }
    }
}

/// Repeat policy applied by queue navigation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at either end of the queue
    #[default]
    Off,
    /// Stay on the current track
    One,
    /// Wrap around to the other end
    All,
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatMode::Off => write!(f, "off"),
            RepeatMode::One => write!(f, "one"),
            RepeatMode::All => write!(f, "all"),
        }
    }
}

/// Category of a playback engine failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineErrorKind {
    /// Unsupported or corrupt media
    Codec,
    /// Missing file or read failure
    Io,
    /// Source exists but may not be read
    Permission,
    /// Engine gave up buffering
    Timeout,
    Unknown,
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrorKind::Codec => write!(f, "codec"),
            EngineErrorKind::Io => write!(f, "io"),
            EngineErrorKind::Permission => write!(f, "permission"),
            EngineErrorKind::Timeout => write!(f, "timeout"),
            EngineErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<std::io::ErrorKind> for EngineErrorKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::PermissionDenied => EngineErrorKind::Permission,
            std::io::ErrorKind::TimedOut => EngineErrorKind::Timeout,
            std::io::ErrorKind::InvalidData => EngineErrorKind::Codec,
            _ => EngineErrorKind::Io,
        }
    }
}

/// Engine failure captured into the playback state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl ErrorDescriptor {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl From<&std::io::Error> for ErrorDescriptor {
    fn from(error: &std::io::Error) -> Self {
        Self::new(error.kind().into(), error.to_string())
    }
}
