//! Playback queue: ordered tracks, navigation, shuffle and repeat

pub mod engine;
pub mod model;
pub mod navigation;

pub use engine::{QueueEngine, Removal};
pub use model::{QueueEntry, QueueSnapshot, QueueState};
