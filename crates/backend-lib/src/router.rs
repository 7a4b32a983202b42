// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, books, index, timers, users};
use crate::middleware::resolve_session;
use crate::storage::Storage;
use crate::AppState;

/// Create the application router
pub fn create_router<S: Storage>(state: Arc<AppState<S>>) -> Router {
    let api = Router::new()
        .route("/timers", get(timers::list_timers::<S>).post(timers::create_timer::<S>))
        .route("/timers/{id}/stop", post(timers::stop_timer::<S>))
        .route("/add-book", post(books::add_book::<S>))
        .route("/users", get(users::list_users::<S>).post(users::create_user::<S>))
        .route(
            "/users/{id}",
            get(users::get_user::<S>)
                .patch(users::update_user::<S>)
                .delete(users::delete_user::<S>),
        );

    Router::new()
        .route("/", get(index::index))
        .route("/login", post(auth::login::<S>))
        .route("/signup", post(auth::signup::<S>))
        .route("/logout", get(auth::logout::<S>))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
