// ============================
// crates/backend-lib/src/handlers/books.rs
// ============================
use std::sync::Arc;

use axum::{extract::State, Json};
use authdemo_common::BooksCount;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::storage::{Counter, Storage};
use crate::AppState;

/// `POST /api/add-book`: bump the signed-in user's book counter
pub async fn add_book<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    context: AuthContext,
) -> Result<Json<BooksCount>, AppError> {
    let user = context.require_user()?;
    let books = state
        .storage
        .increment_counter(&user.id, Counter::Books)
        .await?
        // the session outlived its user
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(BooksCount { books }))
}
