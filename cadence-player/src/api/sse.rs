//! Server-Sent Events stream of playback state
//!
//! Each client is one bridge subscriber backed by a bounded channel. The
//! current state is delivered first, then every publication as event
//! `PlaybackState`. The subscription is dropped when the client disconnects.

use super::AppState;
use crate::bridge::{StateBridge, SubscriberId};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-client buffer; a slower client loses intermediate states
const SSE_CHANNEL_CAPACITY: usize = 32;

const EVENT_NAME: &str = "PlaybackState";

/// Unsubscribes the client when its stream is dropped
struct Subscription {
    bridge: Arc<StateBridge>,
    id: SubscriberId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("SSE client {} disconnected", self.id);
        self.bridge.unsubscribe(self.id);
    }
}

/// GET /events - SSE event stream
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (id, mut rx) = state.bridge.subscribe_channel(SSE_CHANNEL_CAPACITY);
    debug!("New SSE client {}", id);

    if let Err(e) = state.bridge.request_snapshot(id) {
        warn!("Initial snapshot for SSE client failed: {}", e);
    }

    let subscription = Subscription {
        bridge: Arc::clone(&state.bridge),
        id,
    };

    let stream = async_stream::stream! {
        let _subscription = subscription;
        while let Some(message) = rx.recv().await {
            match Event::default().event(EVENT_NAME).json_data(&message) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(e) => warn!("Failed to serialize playback state: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
