// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.

pub mod auth;
pub mod books;
pub mod index;
pub mod timers;
pub mod users;

use axum::{
    extract::FromRequest,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// `axum::Json` whose rejections are [`AppError::InvalidInput`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `302 Found` pointing at `location`
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
