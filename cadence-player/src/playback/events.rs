//! Engine callbacks and their translation into state-machine reactions
//!
//! `react` is the single mapping from (current status, engine event) to what
//! the adapter should do. Every status is listed for every event, so adding
//! a status or an event fails to compile until the table is extended.

use cadence_common::{ErrorDescriptor, PlaybackStatus};
use tokio::sync::mpsc;

/// Low-level notification from the playback engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Buffered position advanced
    Buffering { buffered_position_ms: u64 },
    /// Media prepared; duration as reported by the engine (0 if unknown)
    Ready { duration_ms: u64 },
    /// Position reported by the engine
    Position { position_ms: u64 },
    /// Track played to its end
    Ended,
    /// Codec, I/O or permission failure
    Error(ErrorDescriptor),
}

/// Engine event tagged with the load it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCallback {
    pub generation: u64,
    pub event: EngineEvent,
}

/// Where engines deliver their callbacks
///
/// The receiving end is drained by the playback session, so callbacks are
/// handled on the owner's task whatever thread the engine emits them from.
pub type EngineEventSender = mpsc::UnboundedSender<EngineCallback>;

/// What the adapter does in response to an engine event
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// PREPARING -> READY (then PLAYING if play was requested)
    BecomeReady { duration_ms: u64 },
    UpdateBuffer { buffered_position_ms: u64 },
    UpdatePosition { position_ms: u64 },
    /// Auto-advance, or ENDED when the queue has nothing next
    TrackFinished,
    /// -> ERROR
    Fail(ErrorDescriptor),
    /// Event is meaningless in the current status
    Ignore,
}

/// Map an engine event to a reaction given the current status
pub fn react(status: PlaybackStatus, event: EngineEvent) -> Reaction {
    use PlaybackStatus::*;

    match event {
        EngineEvent::Ready { duration_ms } => match status {
            Preparing => Reaction::BecomeReady { duration_ms },
            Idle | Ready | Playing | Paused | Ended | Error => Reaction::Ignore,
        },
        EngineEvent::Buffering {
            buffered_position_ms,
        } => match status {
            Preparing | Ready | Playing | Paused => Reaction::UpdateBuffer {
                buffered_position_ms,
            },
            Idle | Ended | Error => Reaction::Ignore,
        },
        EngineEvent::Position { position_ms } => match status {
            Ready | Playing | Paused => Reaction::UpdatePosition { position_ms },
            Idle | Preparing | Ended | Error => Reaction::Ignore,
        },
        EngineEvent::Ended => match status {
            Playing => Reaction::TrackFinished,
            Idle | Preparing | Ready | Paused | Ended | Error => Reaction::Ignore,
        },
        EngineEvent::Error(descriptor) => match status {
            Preparing | Ready | Playing | Paused => Reaction::Fail(descriptor),
            Idle | Ended | Error => Reaction::Ignore,
        },
    }
}
