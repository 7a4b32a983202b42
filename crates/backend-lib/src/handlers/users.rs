// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Generic CRUD over profile records, mounted at `/api/users`.
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use authdemo_common::{Profile, ProfileFields};

use super::JsonBody;
use crate::error::AppError;
use crate::storage::Storage;
use crate::validation::{parse_profile_filter, validate_profile_fields};
use crate::AppState;

fn unknown(id: &str) -> AppError {
    AppError::NotFound(format!("Unknown user ID: {id}"))
}

/// `{proto}://{host}/api/users/{id}` for the `Location` header
fn location(headers: &HeaderMap, id: &str) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}/api/users/{id}")
}

/// `GET /api/users?name=&age=&country=`
pub async fn list_users<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Profile>>, AppError> {
    let filter = parse_profile_filter(&params)?;
    let profiles = state.storage.list_profiles(&filter).await?;
    Ok(Json(profiles))
}

/// `GET /api/users/{id}`
pub async fn get_user<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    state
        .storage
        .get_profile(&id)
        .await?
        .map(Json)
        .ok_or_else(|| unknown(&id))
}

/// `POST /api/users`
pub async fn create_user<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    JsonBody(fields): JsonBody<ProfileFields>,
) -> Result<Response, AppError> {
    validate_profile_fields(&fields)?;
    let id = state.storage.create_profile(fields).await?;
    Ok((StatusCode::CREATED, [(header::LOCATION, location(&headers, &id))]).into_response())
}

/// `PATCH /api/users/{id}`
pub async fn update_user<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<ProfileFields>,
) -> Result<StatusCode, AppError> {
    validate_profile_fields(&fields)?;
    if state.storage.update_profile(&id, fields).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown(&id))
    }
}

/// `DELETE /api/users/{id}`
pub async fn delete_user<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.storage.delete_profile(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown(&id))
    }
}
