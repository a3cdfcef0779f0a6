//! HTTP request handlers

use super::AppState;
use crate::error::Error;
use crate::queue::QueueSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadence_common::{PlaybackStateMessage, RepeatMode, Track};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f32,
}

#[derive(Debug, Deserialize)]
pub struct RepeatRequest {
    pub mode: RepeatMode,
}

#[derive(Debug, Deserialize)]
pub struct ShuffleRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetQueueRequest {
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub start_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub track: Track,
}

/// Result of a transport command plus the state after it
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub accepted: bool,
    pub state: PlaybackStateMessage,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub entry_id: Uuid,
    pub queue_length: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

/// Error returned from handlers
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            Error::IndexOutOfRange { .. } | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::EmptyQueue => StatusCode::CONFLICT,
            Error::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                status: "error".to_string(),
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn respond(state: &AppState, accepted: bool) -> ApiResult<CommandResponse> {
    let snapshot = state.session.state().await?;
    Ok(Json(CommandResponse {
        accepted,
        state: snapshot.to_message(),
    }))
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/state
pub async fn get_state(State(state): State<AppState>) -> ApiResult<PlaybackStateMessage> {
    let snapshot = state.session.state().await?;
    Ok(Json(snapshot.to_message()))
}

/// POST /playback/play
pub async fn play(State(state): State<AppState>) -> ApiResult<CommandResponse> {
    let accepted = state.session.play().await?;
    respond(&state, accepted).await
}

/// POST /playback/pause
pub async fn pause(State(state): State<AppState>) -> ApiResult<CommandResponse> {
    let accepted = state.session.pause().await?;
    respond(&state, accepted).await
}

/// POST /playback/stop
pub async fn stop(State(state): State<AppState>) -> ApiResult<CommandResponse> {
    state.session.stop().await?;
    respond(&state, true).await
}

/// POST /playback/next
pub async fn skip_next(State(state): State<AppState>) -> ApiResult<CommandResponse> {
    let accepted = state.session.skip_next().await?;
    respond(&state, accepted).await
}

/// POST /playback/previous
pub async fn skip_previous(State(state): State<AppState>) -> ApiResult<CommandResponse> {
    let accepted = state.session.skip_previous().await?;
    respond(&state, accepted).await
}

/// POST /playback/seek
pub async fn seek(
    State(state): State<AppState>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<CommandResponse> {
    let accepted = state.session.seek(req.position_ms).await?;
    respond(&state, accepted).await
}

/// POST /playback/speed
pub async fn set_speed(
    State(state): State<AppState>,
    Json(req): Json<SpeedRequest>,
) -> ApiResult<CommandResponse> {
    state.session.set_speed(req.speed).await?;
    info!("Playback speed set to {}", req.speed);
    respond(&state, true).await
}

/// POST /playback/repeat
pub async fn set_repeat_mode(
    State(state): State<AppState>,
    Json(req): Json<RepeatRequest>,
) -> ApiResult<CommandResponse> {
    state.session.set_repeat_mode(req.mode).await?;
    respond(&state, true).await
}

/// POST /playback/shuffle
pub async fn set_shuffle(
    State(state): State<AppState>,
    Json(req): Json<ShuffleRequest>,
) -> ApiResult<CommandResponse> {
    state.session.set_shuffle(req.enabled).await?;
    respond(&state, true).await
}

// ============================================================================
// Queue Endpoints
// ============================================================================

/// GET /queue
pub async fn get_queue(State(state): State<AppState>) -> ApiResult<QueueSnapshot> {
    Ok(Json(state.session.queue().await?))
}

/// POST /queue - replace the queue
pub async fn set_queue(
    State(state): State<AppState>,
    Json(req): Json<SetQueueRequest>,
) -> ApiResult<QueueSnapshot> {
    info!(
        "Replacing queue with {} tracks (start {})",
        req.tracks.len(),
        req.start_index
    );
    state.session.set_queue(req.tracks, req.start_index).await?;
    Ok(Json(state.session.queue().await?))
}

/// POST /queue/add
pub async fn add(
    State(state): State<AppState>,
    Json(req): Json<AddRequest>,
) -> ApiResult<AddResponse> {
    let entry_id = state.session.add(req.track).await?;
    let queue = state.session.queue().await?;
    Ok(Json(AddResponse {
        entry_id,
        queue_length: queue.items.len(),
    }))
}

/// DELETE /queue/:index
pub async fn remove_at(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<StatusCode, ApiError> {
    state.session.remove_at(index).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /queue/jump/:index
pub async fn jump_to(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<CommandResponse> {
    state.session.jump_to(index).await?;
    respond(&state, true).await
}

/// POST /queue/clear
pub async fn clear(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.session.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
