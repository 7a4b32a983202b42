use std::time::Duration;

use axum::{
    http::{Method, StatusCode},
    Router,
};
use backend_lib::auth::ChecksumHasher;
use backend_lib::seed::{seed_demo_data, DEMO_PASSWORD, DEMO_USERNAME};
use backend_lib::storage::UserStore;

use crate::test_utils::{
    get, post_form, send_empty, setup_app, setup_app_with, setup_flat_file_app, setup_sqlite_app,
    signup, test_settings,
};

async fn signup_visit_logout(app: &Router) {
    let response = post_form(app, "/signup", "alice", "pw1").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
    let cookie = response
        .set_cookies()
        .into_iter()
        .find(|c| c.starts_with("sessionId="))
        .unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(!cookie.contains("Expires"));
    let token = response.session_cookie().unwrap();

    let page = get(app, "/", Some(&token)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Signed in as <strong>alice</strong>"));

    let books = send_empty(app, Method::POST, "/api/add-book", Some(&token)).await;
    assert_eq!(books.status, StatusCode::OK);
    assert_eq!(books.json()["books"], 1);

    let response = get(app, "/logout", Some(&token)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
    // the cookie is cleared
    assert!(response
        .set_cookies()
        .iter()
        .any(|c| c.starts_with("sessionId=;") || c == "sessionId="));

    let page = get(app, "/", Some(&token)).await;
    assert!(!page.body.contains("Signed in as"));
}

#[tokio::test]
async fn test_signup_visit_logout() {
    let (app, _) = setup_app();
    signup_visit_logout(&app).await;
}

#[tokio::test]
async fn test_signup_visit_logout_flat_file() {
    let (app, _dir) = setup_flat_file_app();
    signup_visit_logout(&app).await;
}

#[tokio::test]
async fn test_signup_visit_logout_sqlite() {
    let app = setup_sqlite_app().await;
    signup_visit_logout(&app).await;
}

#[tokio::test]
async fn test_login_with_existing_account() {
    let (app, _) = setup_app();
    let first = signup(&app, "alice", "pw1").await;

    let response = post_form(&app, "/login", "alice", "pw1").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
    let second = response.session_cookie().unwrap();
    assert_ne!(first, second);

    // both sessions stay valid
    for token in [&first, &second] {
        let page = get(&app, "/", Some(token)).await;
        assert!(page.body.contains("alice"));
    }
}

#[tokio::test]
async fn test_failed_logins_look_alike() {
    let (app, _) = setup_app();
    signup(&app, "alice", "pw1").await;

    for (uri, username, password) in [
        ("/login", "alice", "wrong"),
        ("/login", "nobody", "pw1"),
        ("/signup", "alice", "other"),
        ("/login", "", ""),
    ] {
        let response = post_form(&app, uri, username, password).await;
        assert_eq!(response.status, StatusCode::FOUND, "{uri} {username}");
        assert_eq!(response.location(), Some("/?authError=true"));
        assert!(response.session_cookie().is_none());
    }

    let page = get(&app, "/?authError=true", None).await;
    assert!(page.body.contains("Wrong username or password"));
}

#[tokio::test]
async fn test_logout_twice() {
    let (app, _) = setup_app();
    let token = signup(&app, "alice", "pw1").await;

    let first = get(&app, "/logout", Some(&token)).await;
    assert_eq!(first.status, StatusCode::FOUND);

    // the second logout is anonymous: plain redirect, no cookie change
    let second = get(&app, "/logout", Some(&token)).await;
    assert_eq!(second.status, StatusCode::FOUND);
    assert_eq!(second.location(), Some("/"));
    assert!(second.set_cookies().is_empty());
}

#[tokio::test]
async fn test_anonymous_logout_has_no_side_effects() {
    let (app, _) = setup_app();
    let response = get(&app, "/logout", None).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
    assert!(response.set_cookies().is_empty());
}

/// Fire eight signups for one name at once; exactly one may win
async fn one_concurrent_signup_wins(app: &Router) {
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { post_form(&app, "/signup", "bob", "pw1").await })
        })
        .collect();

    let mut successes = 0;
    for task in tasks {
        let response = task.await.unwrap();
        assert_eq!(response.status, StatusCode::FOUND);
        match response.location() {
            Some("/") => successes += 1,
            Some("/?authError=true") => {},
            other => panic!("unexpected redirect {other:?}"),
        }
    }
    assert_eq!(successes, 1);

    // the winner can log in again
    let response = post_form(app, "/login", "bob", "pw1").await;
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn test_concurrent_signups_for_one_username() {
    let (app, storage) = setup_app();
    one_concurrent_signup_wins(&app).await;
    assert!(storage.find_by_username("bob").await.unwrap().is_some());
}

#[tokio::test]
async fn test_concurrent_signups_for_one_username_flat_file() {
    let (app, _dir) = setup_flat_file_app();
    one_concurrent_signup_wins(&app).await;
}

#[tokio::test]
async fn test_concurrent_signups_for_one_username_sqlite() {
    let app = setup_sqlite_app().await;
    one_concurrent_signup_wins(&app).await;
}

#[tokio::test]
async fn test_demo_account_can_log_in() {
    let (app, storage) = setup_app();
    seed_demo_data(&storage, &ChecksumHasher).await.unwrap();

    let response = post_form(&app, "/login", DEMO_USERNAME, DEMO_PASSWORD).await;
    assert_eq!(response.location(), Some("/"));
    assert!(response.session_cookie().is_some());
}

#[tokio::test]
async fn test_secure_cookie_flags() {
    let mut settings = test_settings();
    settings.session.secure_cookie = true;
    let (app, _) = setup_app_with(settings);

    let response = post_form(&app, "/signup", "alice", "pw1").await;
    let cookie = response
        .set_cookies()
        .into_iter()
        .find(|c| c.starts_with("sessionId="))
        .unwrap();
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn test_expired_session_is_anonymous() {
    let mut settings = test_settings();
    settings.session.ttl_secs = Some(1);
    let (app, storage) = setup_app_with(settings);

    let token = signup(&app, "alice", "pw1").await;
    assert!(get(&app, "/", Some(&token)).await.body.contains("alice"));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let page = get(&app, "/", Some(&token)).await;
    assert!(!page.body.contains("Signed in as"));
    assert_eq!(storage.session_count(), 0);
}
