//! Trail Endpoints
//!
//! Thin HTTP wrappers over the Trail Progression Engine. The complete
//! endpoint keeps the `{success, message, new_state}` contract the
//! trail screen consumes; the daily guard maps to 409 so a retry is
//! distinguishable from a real failure.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::services::{TrailError, TrailSnapshot};
use crate::{error::ApiError, AppState};

// ============ Response Types ============

#[derive(Debug, Serialize)]
pub struct CompleteMissionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<TrailSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub success: bool,
}

// ============ Handlers ============

/// GET /trail/:user_id
///
/// Current display snapshot; 404 until the trail is initialized.
pub async fn get_trail_state(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<TrailSnapshot>, ApiError> {
    let snapshot = state
        .trail
        .current_state(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trail state".to_string()))?;

    Ok(Json(snapshot))
}

/// POST /trail/:user_id/initialize
///
/// Idempotent create-if-absent at stage 1 / day 1.
pub async fn initialize_trail(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<InitializeResponse>, ApiError> {
    state.trail.initialize(user_id).await?;
    Ok(Json(InitializeResponse { success: true }))
}

/// POST /trail/:user_id/complete
///
/// Completes today's mission. A second call on the same civil day
/// returns 409 with `success: false` and leaves the state untouched.
pub async fn complete_mission(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CompleteMissionResponse>), ApiError> {
    match state.trail.complete_today(user_id).await {
        Ok(snapshot) => Ok((
            StatusCode::OK,
            Json(CompleteMissionResponse {
                success: true,
                message: "Mission completed".to_string(),
                new_state: Some(snapshot),
            }),
        )),
        Err(err @ TrailError::AlreadyCompletedToday) => Ok((
            StatusCode::CONFLICT,
            Json(CompleteMissionResponse {
                success: false,
                message: err.to_string(),
                new_state: None,
            }),
        )),
        Err(other) => Err(other.into()),
    }
}
