//! # Cadence Common Library
//!
//! Shared code for the Cadence playback core and its observers:
//! - Track value type
//! - Playback status and the state-change message observers receive
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod track;

pub use error::{Error, Result};
pub use events::{EngineErrorKind, ErrorDescriptor, PlaybackStateMessage, PlaybackStatus, RepeatMode};
pub use track::{Track, TrackId};
