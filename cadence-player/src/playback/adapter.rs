//! Player adapter
//!
//! Owns the queue engine, one media engine and the authoritative
//! [`PlaybackState`]. Transport commands are validated against the current
//! status and update the state before returning; engine callbacks are mapped
//! through [`react`] and applied the same way. Every state change is
//! published to the [`StateBridge`].
//!
//! Engine failures never escape as `Err`: they become `status = Error` with
//! `last_error` set, and the queue stays where it was so the caller can retry
//! (`play`) or skip.

use super::engine::MediaEngine;
use super::events::{react, EngineCallback, Reaction};
use super::state::PlaybackState;
use crate::bridge::StateBridge;
use crate::collaborators::Collaborators;
use crate::error::{Error, Result};
use crate::queue::{QueueEngine, QueueState};
use cadence_common::config::PlaybackDefaults;
use cadence_common::{
    EngineErrorKind, ErrorDescriptor, PlaybackStateMessage, PlaybackStatus, RepeatMode, Track,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Domain state machine over a media engine
pub struct PlayerAdapter {
    queue: QueueEngine,
    engine: Box<dyn MediaEngine>,
    collaborators: Collaborators,
    bridge: Arc<StateBridge>,
    state: PlaybackState,

    /// Bumped on every load and stop; callbacks from older loads are stale
    generation: u64,
    /// Start playing as soon as the current track is ready
    play_when_ready: bool,
    /// Current load has already been reported to the play history
    play_recorded: bool,
    released: bool,
}

impl PlayerAdapter {
    /// Create an idle adapter and publish its initial state
    pub fn new(
        queue: QueueEngine,
        mut engine: Box<dyn MediaEngine>,
        collaborators: Collaborators,
        bridge: Arc<StateBridge>,
        defaults: &PlaybackDefaults,
    ) -> Self {
        let mut state = PlaybackState::new(defaults);
        state.repeat_mode = queue.state().repeat_mode();
        state.shuffle_enabled = queue.state().shuffle_enabled();
        engine.set_speed(state.playback_speed);

        let adapter = Self {
            queue,
            engine,
            collaborators,
            bridge,
            state,
            generation: 0,
            play_when_ready: false,
            play_recorded: false,
            released: false,
        };
        adapter.publish();
        adapter
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn queue(&self) -> &QueueState {
        self.queue.state()
    }

    /// Generation of the most recent load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    // ------------------------------------------------------------------
    // Queue edits
    // ------------------------------------------------------------------

    /// Replace the queue and load the selected track without playing it
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        info!("Setting queue: {} tracks, start index {}", tracks.len(), start_index);
        self.queue.set_queue(tracks, start_index);
        if self.queue.current().is_some() {
            self.load(false);
        } else {
            self.unload();
        }
    }

    /// Append a track; loads it if the queue was empty
    pub fn add(&mut self, track: Track) -> Uuid {
        let was_empty = self.queue.state().is_empty();
        let entry_id = self.queue.add(track);
        if was_empty {
            self.load(false);
        }
        entry_id
    }

    /// Remove the entry at `index`; removing the current entry loads its successor
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        let resume = self.wants_playback();
        let removal = self.queue.remove_at(index)?;
        info!("Removed {} from queue position {}", removal.entry.track.id, index);

        if removal.current_changed {
            if self.queue.current().is_some() {
                self.load(resume);
            } else {
                self.unload();
            }
        }
        Ok(())
    }

    /// Make the entry at `index` current and load it
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        let resume = self.wants_playback();
        self.queue.jump_to(index)?;
        self.load(resume);
        Ok(())
    }

    /// Empty the queue and stop
    pub fn clear(&mut self) {
        info!("Clearing queue");
        self.queue.clear();
        self.unload();
    }

    // ------------------------------------------------------------------
    // Transport commands
    // ------------------------------------------------------------------

    /// Start or resume playback
    ///
    /// From ERROR this retries the current track; from IDLE or ENDED it
    /// reloads the current track and plays it. Returns false if there is
    /// nothing to play or playback is already running.
    pub fn play(&mut self) -> bool {
        match self.state.status {
            PlaybackStatus::Ready | PlaybackStatus::Paused => {
                self.play_when_ready = true;
                self.engine.play();
                self.set_status(PlaybackStatus::Playing);
                self.record_play();
                self.publish();
                true
            }
            PlaybackStatus::Preparing => {
                self.play_when_ready = true;
                true
            }
            PlaybackStatus::Playing => false,
            PlaybackStatus::Idle | PlaybackStatus::Ended | PlaybackStatus::Error => {
                if self.queue.current().is_none() {
                    debug!("Play ignored: queue is empty");
                    return false;
                }
                self.load(true);
                true
            }
        }
    }

    pub fn pause(&mut self) -> bool {
        match self.state.status {
            PlaybackStatus::Ready | PlaybackStatus::Playing => {
                self.play_when_ready = false;
                self.engine.pause();
                self.state.position_ms = self.clamp_position(self.engine.position_ms());
                self.set_status(PlaybackStatus::Paused);
                self.publish();
                true
            }
            PlaybackStatus::Preparing => {
                self.play_when_ready = false;
                true
            }
            PlaybackStatus::Idle
            | PlaybackStatus::Paused
            | PlaybackStatus::Ended
            | PlaybackStatus::Error => false,
        }
    }

    /// Stop playback; the queue and current track are kept
    pub fn stop(&mut self) {
        self.generation += 1;
        self.play_when_ready = false;
        self.engine.stop();
        self.state.position_ms = 0;
        self.state.buffered_position_ms = 0;
        self.set_status(PlaybackStatus::Idle);
        self.publish();
    }

    /// Seek within the prepared track; a no-op unless READY, PLAYING or PAUSED
    pub fn seek(&mut self, position_ms: u64) -> bool {
        match self.state.status {
            PlaybackStatus::Ready | PlaybackStatus::Playing | PlaybackStatus::Paused => {
                let position_ms = self.clamp_position(position_ms);
                self.engine.seek(position_ms);
                self.state.position_ms = position_ms;
                debug!("Seeked to {}ms", position_ms);
                self.publish();
                true
            }
            PlaybackStatus::Idle
            | PlaybackStatus::Preparing
            | PlaybackStatus::Ended
            | PlaybackStatus::Error => {
                debug!("Seek ignored in status {}", self.state.status);
                false
            }
        }
    }

    /// Load the next track per the queue's repeat policy
    ///
    /// Always accepted, including from ERROR; returns false only when the
    /// queue has no next entry.
    pub fn skip_next(&mut self) -> bool {
        let resume = self.wants_playback();
        if !self.queue.advance() {
            debug!("Skip next ignored: no next entry");
            return false;
        }
        self.load(resume);
        true
    }

    /// Load the previous track per the queue's repeat policy
    pub fn skip_previous(&mut self) -> bool {
        let resume = self.wants_playback();
        if !self.queue.retreat() {
            debug!("Skip previous ignored: no previous entry");
            return false;
        }
        self.load(resume);
        true
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "playback speed must be a positive number, got {}",
                speed
            )));
        }
        self.engine.set_speed(speed);
        self.state.playback_speed = speed;
        self.publish();
        Ok(())
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.queue.set_repeat_mode(mode);
        self.state.repeat_mode = mode;
        self.publish();
    }

    /// Set shuffle; the current track stays current
    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.queue.set_shuffle(enabled) {
            self.state.shuffle_enabled = enabled;
            self.publish();
        }
    }

    /// Flip shuffle and return the new setting
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = !self.queue.state().shuffle_enabled();
        self.set_shuffle(enabled);
        enabled
    }

    // ------------------------------------------------------------------
    // Engine callbacks and timer
    // ------------------------------------------------------------------

    pub fn handle_engine_event(&mut self, callback: EngineCallback) {
        if self.released {
            return;
        }
        if callback.generation != self.generation {
            debug!(
                "Ignoring stale engine callback (generation {}, current {}): {:?}",
                callback.generation, self.generation, callback.event
            );
            return;
        }

        match react(self.state.status, callback.event) {
            Reaction::BecomeReady { duration_ms } => {
                if duration_ms > 0 {
                    self.state.duration_ms = duration_ms;
                }
                self.set_status(PlaybackStatus::Ready);
                self.publish();

                if self.play_when_ready {
                    self.engine.play();
                    self.set_status(PlaybackStatus::Playing);
                    self.record_play();
                    self.publish();
                }
            }
            Reaction::UpdateBuffer {
                buffered_position_ms,
            } => {
                self.state.buffered_position_ms = self.clamp_position(buffered_position_ms);
                self.publish();
            }
            Reaction::UpdatePosition { position_ms } => {
                self.state.position_ms = self.clamp_position(position_ms);
                self.publish();
            }
            Reaction::TrackFinished => self.finish_track(),
            Reaction::Fail(descriptor) => self.fail(descriptor),
            Reaction::Ignore => {
                debug!("Engine event ignored in status {}", self.state.status);
            }
        }
    }

    /// Position timer tick; only meaningful while PLAYING
    pub fn tick(&mut self) {
        if self.released || self.state.status != PlaybackStatus::Playing {
            return;
        }
        let position_ms = self.clamp_position(self.engine.position_ms());
        if position_ms != self.state.position_ms {
            self.state.position_ms = position_ms;
            self.publish();
        }
    }

    /// Re-publish the current state to every subscriber
    pub fn publish_current(&self) -> PlaybackStateMessage {
        self.publish()
    }

    /// Release the engine and go IDLE; later calls do nothing
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        info!("Releasing player");
        self.released = true;
        self.generation += 1;
        self.play_when_ready = false;
        self.engine.release();
        self.state.position_ms = 0;
        self.state.buffered_position_ms = 0;
        self.set_status(PlaybackStatus::Idle);
        self.publish();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Load the queue's current entry into the engine
    fn load(&mut self, play_when_ready: bool) {
        let Some(track) = self.queue.current().map(|entry| entry.track.clone()) else {
            self.unload();
            return;
        };

        self.generation += 1;
        self.play_when_ready = play_when_ready;
        self.play_recorded = false;
        self.state.position_ms = 0;
        self.state.buffered_position_ms = 0;
        self.state.duration_ms = track.duration_ms;
        self.state.last_error = None;
        self.state.current_track = Some(track.clone());

        info!(
            "Loading track {} ({}), generation {}",
            track.id, track.title, self.generation
        );

        match self.collaborators.resolver.resolve(&track) {
            Ok(media) => {
                self.engine.prepare(media, self.generation);
                self.set_status(PlaybackStatus::Preparing);
                self.publish();
            }
            Err(e) => {
                let descriptor = match e {
                    Error::Engine(descriptor) => descriptor,
                    other => ErrorDescriptor::new(EngineErrorKind::Io, other.to_string()),
                };
                // The previous track may still be prepared or playing
                self.engine.stop();
                self.fail(descriptor);
            }
        }
    }

    /// Stop with no current track
    fn unload(&mut self) {
        self.generation += 1;
        self.play_when_ready = false;
        self.engine.stop();
        self.state.current_track = None;
        self.state.position_ms = 0;
        self.state.duration_ms = 0;
        self.state.buffered_position_ms = 0;
        self.state.last_error = None;
        self.set_status(PlaybackStatus::Idle);
        self.publish();
    }

    fn finish_track(&mut self) {
        if self.queue.peek_next().is_none() {
            info!("Queue finished");
            self.play_when_ready = false;
            self.state.position_ms = self.state.duration_ms;
            self.set_status(PlaybackStatus::Ended);
            self.publish();
            return;
        }

        self.queue.advance();
        self.load(true);
    }

    fn fail(&mut self, descriptor: ErrorDescriptor) {
        error!(
            "Playback failed for {:?}: {}",
            self.state.current_track.as_ref().map(|t| t.id.to_string()),
            descriptor
        );
        self.state.last_error = Some(descriptor);
        self.set_status(PlaybackStatus::Error);
        self.publish();
    }

    fn record_play(&mut self) {
        if self.play_recorded {
            return;
        }
        if let Some(track) = &self.state.current_track {
            self.collaborators.history.record_play(track, Utc::now());
            self.play_recorded = true;
        }
    }

    /// Whether a newly loaded track should start playing on its own
    fn wants_playback(&self) -> bool {
        self.play_when_ready || self.state.status == PlaybackStatus::Playing
    }

    fn clamp_position(&self, position_ms: u64) -> u64 {
        if self.state.duration_ms > 0 {
            position_ms.min(self.state.duration_ms)
        } else {
            position_ms
        }
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.state.status != status {
            debug!("Playback status {} -> {}", self.state.status, status);
            self.state.status = status;
        }
    }

    fn publish(&self) -> PlaybackStateMessage {
        let message = self.state.to_message();
        self.bridge.publish(message.clone());
        message
    }
}
