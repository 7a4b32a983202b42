//! Soft authentication: every request gets an [`AuthContext`], anonymous
//! unless its `sessionId` cookie names a live session of an existing user.
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use authdemo_common::SESSION_COOKIE;

use crate::error::AppError;
use crate::storage::{Storage, User};
use crate::AppState;

/// Identity of the current request
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user: Option<User>,
    /// Token of the session `user` was resolved from
    pub token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The signed-in user, or [`AppError::Unauthorized`]
    pub fn require_user(&self) -> Result<&User, AppError> {
        self.user.as_ref().ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // routes mounted outside the middleware see an anonymous request
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolve the session cookie and attach the result to the request.
///
/// Never rejects for missing or unknown identity. Backend failures are
/// returned as errors.
pub async fn resolve_session<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = match jar.get(SESSION_COOKIE) {
        None => AuthContext::anonymous(),
        Some(cookie) => {
            let token = cookie.value().to_string();
            match state.auth.resolve(&token).await? {
                Some(user) => AuthContext {
                    user: Some(user),
                    token: Some(token),
                },
                None => {
                    tracing::debug!("session cookie did not resolve to a user");
                    AuthContext::anonymous()
                },
            }
        },
    };

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
