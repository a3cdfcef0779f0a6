//! External collaborators of the playback core
//!
//! The core only sees these through traits: a resolver that turns a track's
//! locator into something the engine can open, and a history sink that
//! records plays. Preferences arrive as
//! [`PlaybackDefaults`](cadence_common::config::PlaybackDefaults).

use crate::error::{Error, Result};
use crate::playback::MediaHandle;
use cadence_common::{EngineErrorKind, ErrorDescriptor, Track, TrackId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Turns a track into a playable handle
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, track: &Track) -> Result<MediaHandle>;
}

/// Receives a notification each time a track starts playing
pub trait PlayHistory: Send + Sync {
    fn record_play(&self, track: &Track, at: DateTime<Utc>);
}

/// Collaborators handed to a playback session
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn SourceResolver>,
    pub history: Arc<dyn PlayHistory>,
}

impl Collaborators {
    pub fn new(resolver: Arc<dyn SourceResolver>, history: Arc<dyn PlayHistory>) -> Self {
        Self { resolver, history }
    }
}

/// Resolves locators against a music root folder
///
/// Accepts absolute paths, `file://` URIs and paths relative to the root.
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    root: PathBuf,
}

impl RootFolderResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceResolver for RootFolderResolver {
    fn resolve(&self, track: &Track) -> Result<MediaHandle> {
        let locator = track.locator.trim();
        if locator.is_empty() {
            return Err(Error::Engine(ErrorDescriptor::new(
                EngineErrorKind::Io,
                format!("track {} has no source locator", track.id),
            )));
        }

        let path = PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator));
        let path = if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        };

        debug!("Resolved track {} to {}", track.id, path.display());
        Ok(MediaHandle {
            path,
            duration_hint_ms: track.duration_ms,
        })
    }
}

/// Play count and last play time of one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayRecord {
    pub play_count: u32,
    pub last_played: DateTime<Utc>,
}

/// Play history kept in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryPlayHistory {
    records: Mutex<HashMap<TrackId, PlayRecord>>,
}

impl InMemoryPlayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: &TrackId) -> Option<PlayRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .copied()
    }
}

impl PlayHistory for InMemoryPlayHistory {
    fn record_play(&self, track: &Track, at: DateTime<Utc>) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let record = records.entry(track.id.clone()).or_insert(PlayRecord {
            play_count: 0,
            last_played: at,
        });
        record.play_count += 1;
        record.last_played = at;
    }
}
