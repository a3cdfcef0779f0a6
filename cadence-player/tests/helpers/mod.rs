//! Test helpers for cadence-player integration tests
//!
//! - `MockEngine` + `EngineProbe`: scriptable media engine that records the
//!   commands it receives and lets tests emit callbacks
//! - `Harness`: a `PlayerAdapter` wired to the mock engine and a collecting
//!   subscriber
//! - track builders and a resolver that fails for chosen tracks

#![allow(dead_code)]

use cadence_common::config::PlaybackDefaults;
use cadence_common::{
    EngineErrorKind, ErrorDescriptor, PlaybackStateMessage, PlaybackStatus, Track, TrackId,
};
use cadence_player::bridge::{DeliveryError, StateBridge, Subscriber, SubscriberId};
use cadence_player::collaborators::{
    Collaborators, InMemoryPlayHistory, RootFolderResolver, SourceResolver,
};
use cadence_player::playback::{
    EngineCallback, EngineEvent, EngineEventSender, MediaEngine, MediaHandle, PlayerAdapter,
};
use cadence_player::queue::QueueEngine;
use cadence_player::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Tracks
// ============================================================================

pub fn track(id: &str) -> Track {
    Track::new(id, format!("{}.flac", id), format!("Track {}", id))
        .with_artist("Test Artist")
        .with_duration_ms(180_000)
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

// ============================================================================
// Mock engine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Prepare { path: PathBuf, generation: u64 },
    Play,
    Pause,
    Seek(u64),
    SetSpeed(f32),
    Stop,
    Release,
}

#[derive(Default)]
struct ProbeState {
    calls: Vec<EngineCall>,
    position_ms: u64,
    last_generation: u64,
    events: Option<EngineEventSender>,
}

/// Shared view into a `MockEngine`
#[derive(Clone, Default)]
pub struct EngineProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl EngineProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn prepare_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::Prepare { .. }))
            .count()
    }

    /// Position the engine reports from now on
    pub fn set_position(&self, position_ms: u64) {
        self.inner.lock().unwrap().position_ms = position_ms;
    }

    /// Generation passed to the most recent `prepare`
    pub fn last_generation(&self) -> u64 {
        self.inner.lock().unwrap().last_generation
    }

    /// Send `event` tagged with the latest generation (session tests only)
    pub fn emit(&self, event: EngineEvent) {
        let generation = self.last_generation();
        self.emit_with(generation, event);
    }

    pub fn emit_with(&self, generation: u64, event: EngineEvent) {
        let state = self.inner.lock().unwrap();
        let events = state
            .events
            .as_ref()
            .expect("engine was not built with a callback sender");
        events.send(EngineCallback { generation, event }).unwrap();
    }
}

pub struct MockEngine {
    probe: EngineProbe,
}

impl MockEngine {
    pub fn new(probe: EngineProbe) -> Self {
        Self { probe }
    }

    /// Engine whose probe can emit callbacks on `events`
    pub fn connected(probe: EngineProbe, events: EngineEventSender) -> Self {
        probe.inner.lock().unwrap().events = Some(events);
        Self { probe }
    }

    fn record(&self, call: EngineCall) {
        self.probe.inner.lock().unwrap().calls.push(call);
    }
}

impl MediaEngine for MockEngine {
    fn prepare(&mut self, media: MediaHandle, generation: u64) {
        {
            let mut state = self.probe.inner.lock().unwrap();
            state.last_generation = generation;
            state.position_ms = 0;
        }
        self.record(EngineCall::Prepare {
            path: media.path,
            generation,
        });
    }

    fn play(&mut self) {
        self.record(EngineCall::Play);
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
    }

    fn seek(&mut self, position_ms: u64) {
        self.probe.inner.lock().unwrap().position_ms = position_ms;
        self.record(EngineCall::Seek(position_ms));
    }

    fn set_speed(&mut self, speed: f32) {
        self.record(EngineCall::SetSpeed(speed));
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
    }

    fn position_ms(&self) -> u64 {
        self.probe.inner.lock().unwrap().position_ms
    }

    fn release(&mut self) {
        self.record(EngineCall::Release);
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Resolver that fails for the listed track ids
pub struct FailingResolver {
    failing: HashSet<TrackId>,
    inner: RootFolderResolver,
}

impl FailingResolver {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|id| TrackId::new(*id)).collect(),
            inner: RootFolderResolver::new("/music"),
        }
    }
}

impl SourceResolver for FailingResolver {
    fn resolve(&self, track: &Track) -> Result<MediaHandle> {
        if self.failing.contains(&track.id) {
            return Err(Error::Engine(ErrorDescriptor::new(
                EngineErrorKind::Permission,
                format!("cannot open {}", track.locator),
            )));
        }
        self.inner.resolve(track)
    }
}

/// Subscriber that keeps every message it receives
#[derive(Default)]
pub struct CollectingSubscriber {
    messages: Mutex<Vec<PlaybackStateMessage>>,
}

impl CollectingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<PlaybackStateMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<PlaybackStateMessage> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

impl Subscriber for CollectingSubscriber {
    fn deliver(&self, message: &PlaybackStateMessage) -> std::result::Result<(), DeliveryError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Subscriber whose receiver is gone
pub struct ClosedSubscriber;

impl Subscriber for ClosedSubscriber {
    fn deliver(&self, _message: &PlaybackStateMessage) -> std::result::Result<(), DeliveryError> {
        Err(DeliveryError::Disconnected)
    }
}

// ============================================================================
// Adapter harness
// ============================================================================

pub struct Harness {
    pub adapter: PlayerAdapter,
    pub probe: EngineProbe,
    pub bridge: Arc<StateBridge>,
    pub history: Arc<InMemoryPlayHistory>,
    pub observer: Arc<CollectingSubscriber>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(RootFolderResolver::new("/music")))
    }

    pub fn with_resolver(resolver: Arc<dyn SourceResolver>) -> Self {
        Self::build(resolver, QueueEngine::with_seed(42), &PlaybackDefaults::default())
    }

    pub fn build(
        resolver: Arc<dyn SourceResolver>,
        queue: QueueEngine,
        defaults: &PlaybackDefaults,
    ) -> Self {
        let probe = EngineProbe::new();
        let bridge = Arc::new(StateBridge::new());
        let observer = Arc::new(CollectingSubscriber::new());
        bridge.subscribe(SubscriberId::new(), observer.clone());
        let history = Arc::new(InMemoryPlayHistory::new());

        let adapter = PlayerAdapter::new(
            queue,
            Box::new(MockEngine::new(probe.clone())),
            Collaborators::new(resolver, history.clone()),
            Arc::clone(&bridge),
            defaults,
        );

        Self {
            adapter,
            probe,
            bridge,
            history,
            observer,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.adapter.state().status
    }

    pub fn current_id(&self) -> Option<String> {
        self.adapter
            .state()
            .current_track
            .as_ref()
            .map(|t| t.id.to_string())
    }

    /// Deliver a callback for the current generation
    pub fn engine(&mut self, event: EngineEvent) {
        let generation = self.adapter.generation();
        self.adapter
            .handle_engine_event(EngineCallback { generation, event });
    }

    pub fn ready(&mut self) {
        let duration_ms = self.adapter.state().duration_ms;
        self.engine(EngineEvent::Ready { duration_ms });
    }

    /// Load `ids` and bring the first track to PLAYING
    pub fn playing(ids: &[&str]) -> Self {
        let mut h = Self::new();
        h.adapter.set_queue(tracks(ids), 0);
        h.ready();
        assert!(h.adapter.play());
        assert_eq!(h.status(), PlaybackStatus::Playing);
        h
    }
}
