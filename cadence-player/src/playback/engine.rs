//! Playback engine seam
//!
//! A `MediaEngine` does the actual media work. Every method only issues a
//! command and returns; results come back asynchronously as
//! [`EngineCallback`](super::EngineCallback)s on the sender the engine was
//! built with, tagged with the generation passed to `prepare`.

use std::path::PathBuf;

/// Something the engine can open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    pub path: PathBuf,
    /// Duration known from the library (0 if unknown)
    pub duration_hint_ms: u64,
}

/// Low-level playback engine driven by the player adapter
pub trait MediaEngine: Send {
    /// Start preparing `media` in the background
    ///
    /// Any earlier track is abandoned. Callbacks for this track carry `generation`.
    fn prepare(&mut self, media: MediaHandle, generation: u64);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position_ms: u64);

    fn set_speed(&mut self, speed: f32);

    /// Stop playback and drop the prepared media
    fn stop(&mut self);

    /// Current playback position of the prepared media
    fn position_ms(&self) -> u64;

    /// Release all engine resources; no callbacks follow
    fn release(&mut self);
}
