use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::test_utils::{get, send_empty, send_json, setup_app};

#[tokio::test]
async fn test_timer_lifecycle() {
    let (app, _) = setup_app();

    let response = send_json(&app, Method::POST, "/api/timers", json!({ "description": "Tea" }), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let timer = response.json();
    assert_eq!(timer["description"], "Tea");
    assert_eq!(timer["isActive"], true);
    assert!(timer["start"].is_i64());
    let id = timer["id"].as_str().unwrap().to_string();

    let active = get(&app, "/api/timers?isActive=true", None).await.json();
    assert_eq!(active.as_array().unwrap().len(), 1);
    let inactive = get(&app, "/api/timers", None).await.json();
    assert!(inactive.as_array().unwrap().is_empty());

    let uri = format!("/api/timers/{id}/stop");
    let stopped = send_empty(&app, Method::POST, &uri, None).await;
    assert_eq!(stopped.status, StatusCode::OK);
    let stopped = stopped.json();
    assert_eq!(stopped["isActive"], false);
    let duration = stopped["duration"].as_i64().unwrap();
    assert_eq!(
        duration,
        stopped["end"].as_i64().unwrap() - stopped["start"].as_i64().unwrap()
    );

    // stopping again changes nothing
    let again = send_empty(&app, Method::POST, &uri, None).await.json();
    assert_eq!(again["duration"].as_i64(), Some(duration));

    let inactive = get(&app, "/api/timers?isActive=false", None).await.json();
    assert_eq!(inactive.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stop_unknown_timer() {
    let (app, _) = setup_app();
    let response = send_empty(&app, Method::POST, "/api/timers/nope/stop", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_overlong_description_is_rejected() {
    let (app, _) = setup_app();
    let response = send_json(
        &app,
        Method::POST,
        "/api/timers",
        json!({ "description": "x".repeat(201) }),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mistyped_description_is_bad_request() {
    let (app, _) = setup_app();
    let response = send_json(&app, Method::POST, "/api/timers", json!({ "description": 5 }), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, "JSON body has missing or mistyped fields");
}
