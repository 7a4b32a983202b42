// ============================
// crates/backend-lib/src/handlers/timers.rs
// ============================
//! Timer API. Not tied to authentication.
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use authdemo_common::{NewTimer, Timer, TimerQuery};
use chrono::Utc;

use super::JsonBody;
use crate::error::AppError;
use crate::storage::Storage;
use crate::validation::validate_description;
use crate::AppState;

/// `GET /api/timers?isActive=true`
pub async fn list_timers<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<TimerQuery>,
) -> Result<Json<Vec<Timer>>, AppError> {
    let timers = state.storage.list_timers(query.wants_active()).await?;
    Ok(Json(timers))
}

/// `POST /api/timers`
pub async fn create_timer<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(body): JsonBody<NewTimer>,
) -> Result<Json<Timer>, AppError> {
    validate_description(&body.description)?;
    let timer = state.storage.create_timer(body.description).await?;
    tracing::debug!(timer_id = %timer.id, "timer started");
    Ok(Json(timer))
}

/// `POST /api/timers/{id}/stop`. Stopping a stopped timer returns it unchanged.
pub async fn stop_timer<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Timer>, AppError> {
    state
        .storage
        .stop_timer(&id, Utc::now())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Unknown timer ID: {id}")))
}
