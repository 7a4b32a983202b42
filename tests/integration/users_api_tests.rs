use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use crate::test_utils::{get, send, send_empty, send_json, setup_app};

#[tokio::test]
async fn test_profile_round_trip() {
    let (app, _) = setup_app();

    let response = send_json(
        &app,
        Method::POST,
        "/api/users",
        json!({ "name": "Ann", "age": 30, "country": "NZ", "admin": true }),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body.is_empty());
    let location = response.location().unwrap().to_string();
    let path = location.strip_prefix("http://localhost:3000").unwrap().to_string();
    assert!(path.starts_with("/api/users/"));

    let profile = get(&app, &path, None).await;
    assert_eq!(profile.status, StatusCode::OK);
    let profile = profile.json();
    assert_eq!(profile["name"], "Ann");
    assert_eq!(profile["age"], 30);
    // unknown fields are not stored
    assert!(profile.get("admin").is_none());

    let response = send_json(&app, Method::PATCH, &path, json!({ "age": 31 }), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let profile = get(&app, &path, None).await.json();
    assert_eq!(profile["age"], 31);
    assert_eq!(profile["country"], "NZ");

    let listed = get(&app, "/api/users?country=NZ", None).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let listed = get(&app, "/api/users?age=30", None).await.json();
    assert!(listed.as_array().unwrap().is_empty());

    let response = send_empty(&app, Method::DELETE, &path, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = get(&app, &path, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_ids() {
    let (app, _) = setup_app();

    let response = get(&app, "/api/users/missing", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, "Unknown user ID: missing");

    let response = send_json(&app, Method::PATCH, "/api/users/missing", json!({ "age": 1 }), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send_empty(&app, Method::DELETE, "/api/users/missing", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_filters_and_fields() {
    let (app, _) = setup_app();

    let response = get(&app, "/api/users?password=x", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = get(&app, "/api/users?age=old", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send_json(&app, Method::POST, "/api/users", json!({ "age": 200 }), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mistyped_body_is_bad_request() {
    let (app, _) = setup_app();

    let response = send_json(&app, Method::POST, "/api/users", json!({ "age": "thirty" }), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, "JSON body has missing or mistyped fields");
    assert!(!response.body.contains("expected i64"));

    let response = send_json(&app, Method::PATCH, "/api/users/1", json!({ "name": 7 }), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.body.contains("invalid type"));
}

#[tokio::test]
async fn test_body_that_is_not_json() {
    let (app, _) = setup_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, "Malformed JSON body");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .body(Body::from("name=Ann"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, "Expected a JSON body");
}
