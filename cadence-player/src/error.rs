//! Error types for cadence-player
//!
//! Queue edits and session commands return these as typed results. Engine
//! failures are the exception: the player adapter captures them into the
//! playback state instead of returning them.

use crate::bridge::SubscriberId;
use cadence_common::ErrorDescriptor;
use thiserror::Error;

/// Main error type for cadence-player
#[derive(Error, Debug)]
pub enum Error {
    /// Queue edit or jump with an invalid index; the queue is unchanged
    #[error("Index {index} out of range for queue of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Queue edit or jump on an empty queue
    #[error("Queue is empty")]
    EmptyQueue,

    /// Playback engine or source resolution failure
    #[error("Engine error: {0}")]
    Engine(ErrorDescriptor),

    /// Bridge delivery to one subscriber failed
    #[error("Subscriber {subscriber} unreachable: {reason}")]
    SubscriberUnreachable {
        subscriber: SubscriberId,
        reason: String,
    },

    /// Invalid request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The playback session has been released or its task has exited
    #[error("Playback session closed")]
    SessionClosed,
}

/// Convenience Result type using cadence-player Error
pub type Result<T> = std::result::Result<T, Error>;
