//! # Cadence Player Library (cadence-player)
//!
//! Playback core of the cadence music player.
//!
//! - [`queue`]: ordered queue with shuffle and repeat policy
//! - [`playback`]: the player adapter state machine over a [`MediaEngine`](playback::MediaEngine)
//! - [`bridge`]: publish/subscribe fan-out of playback state to observers
//! - [`session`]: single-owner task serializing commands, engine callbacks
//!   and the position timer
//! - [`api`]: HTTP/SSE control surface

pub mod api;
pub mod bridge;
pub mod collaborators;
pub mod error;
pub mod playback;
pub mod queue;
pub mod session;

pub use error::{Error, Result};
pub use session::{PlaybackSession, SessionConfig, SessionHandle};
