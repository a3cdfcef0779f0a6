//! HTTP control surface
//!
//! Thin axum layer over a [`SessionHandle`]: every route forwards to one
//! session command, and `/events` streams bridge publications as SSE.

pub mod handlers;
pub mod sse;

use crate::bridge::StateBridge;
use crate::session::SessionHandle;
use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub bridge: Arc<StateBridge>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Transport
        .route("/playback/state", get(handlers::get_state))
        .route("/playback/play", post(handlers::play))
        .route("/playback/pause", post(handlers::pause))
        .route("/playback/stop", post(handlers::stop))
        .route("/playback/next", post(handlers::skip_next))
        .route("/playback/previous", post(handlers::skip_previous))
        .route("/playback/seek", post(handlers::seek))
        .route("/playback/speed", post(handlers::set_speed))
        .route("/playback/repeat", post(handlers::set_repeat_mode))
        .route("/playback/shuffle", post(handlers::set_shuffle))
        // Queue
        .route("/queue", get(handlers::get_queue).post(handlers::set_queue))
        .route("/queue/add", post(handlers::add))
        .route("/queue/clear", post(handlers::clear))
        .route("/queue/jump/:index", post(handlers::jump_to))
        .route("/queue/:index", delete(handlers::remove_at))
        // SSE
        .route("/events", get(sse::event_stream))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "cadence-player",
        "version": env!("CARGO_PKG_VERSION"),
        "session_open": !state.session.is_closed(),
        "subscribers": state.bridge.subscriber_count(),
    }))
}
