//! Player adapter and its playback-engine seam

pub mod adapter;
pub mod clock_engine;
pub mod engine;
pub mod events;
pub mod state;

pub use adapter::PlayerAdapter;
pub use clock_engine::ClockEngine;
pub use engine::{MediaEngine, MediaHandle};
pub use events::{EngineCallback, EngineEvent, EngineEventSender, Reaction};
pub use state::PlaybackState;
