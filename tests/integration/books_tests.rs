use axum::http::{Method, StatusCode};

use crate::test_utils::{get, send_empty, setup_app, signup};

#[tokio::test]
async fn test_add_book_requires_login() {
    let (app, _) = setup_app();
    let response = send_empty(&app, Method::POST, "/api/add-book", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = send_empty(&app, Method::POST, "/api/add-book", Some("bogus")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_book_counts_per_user() {
    let (app, _) = setup_app();
    let alice = signup(&app, "alice", "pw1").await;
    let bob = signup(&app, "bob", "pw2").await;

    for expected in 1..=3 {
        let response = send_empty(&app, Method::POST, "/api/add-book", Some(&alice)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), serde_json::json!({ "books": expected }));
    }

    let response = send_empty(&app, Method::POST, "/api/add-book", Some(&bob)).await;
    assert_eq!(response.json()["books"], 1);

    let page = get(&app, "/", Some(&alice)).await;
    assert!(page.body.contains("<span id=\"books\">3</span>"));
}
