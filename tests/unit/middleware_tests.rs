use axum::http::StatusCode;
use backend_lib::storage::{SessionStore, UserId};

use crate::test_utils::{get, setup_app};

#[tokio::test]
async fn test_landing_page_is_public() {
    let (app, _) = setup_app();
    let response = get(&app, "/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("action=\"/login\""));
}

#[tokio::test]
async fn test_garbage_cookie_is_anonymous() {
    let (app, _) = setup_app();
    let response = get(&app, "/", Some("not-a-real-token")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("action=\"/login\""));
}

#[tokio::test]
async fn test_session_of_missing_user_is_anonymous() {
    let (app, storage) = setup_app();
    let token = storage
        .create_session(&UserId::new("deleted"), None)
        .await
        .unwrap();

    let response = get(&app, "/", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body.contains("Signed in as"));
}
