use axum::{http::StatusCode, response::IntoResponse};
use backend_lib::{error::AppError, storage::StoreError};

async fn body_of(error: AppError) -> (StatusCode, String) {
    let response = error.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_not_found_is_verbatim() {
    let (status, body) = body_of(AppError::NotFound("Unknown user ID: 9".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Unknown user ID: 9");
}

#[tokio::test]
async fn test_storage_errors_are_sanitized() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "/var/lib/secret: disk full");
    let (status, body) = body_of(StoreError::Io(io).into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal server error");
}

#[test]
fn test_username_taken_maps_to_conflict() {
    let error: AppError = StoreError::UsernameTaken.into();
    assert_eq!(error.status_code(), StatusCode::CONFLICT);
    assert_eq!(error.error_code(), "USER_001");
}

#[test]
fn test_error_codes() {
    assert_eq!(AppError::Unauthorized.error_code(), "AUTH_001");
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::Internal("x".into()).client_message(), "Internal server error");
}
