// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Login, signup and logout.
//!
//! All three answer with a redirect. Credential failures of any kind go to
//! `/?authError=true` so that an unknown user, a wrong password and a taken
//! username look the same to the client.
use std::sync::Arc;

use axum::{extract::State, response::Response, Form};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use authdemo_common::{Credentials, SESSION_COOKIE};

use super::found;
use crate::auth::AuthOutcome;
use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::storage::Storage;
use crate::AppState;

const AUTH_ERROR_LOCATION: &str = "/?authError=true";

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, token)).http_only(true).path("/");
    if secure {
        cookie = cookie.secure(true).same_site(SameSite::Lax);
    }
    cookie.build()
}

fn finish<S>(state: &AppState<S>, jar: CookieJar, outcome: AuthOutcome) -> (CookieJar, Response) {
    match outcome {
        AuthOutcome::Authenticated { token, .. } => {
            let cookie = session_cookie(token, state.settings.session.secure_cookie);
            (jar.add(cookie), found("/"))
        },
        AuthOutcome::Rejected => (jar, found(AUTH_ERROR_LOCATION)),
    }
}

/// `POST /login`
pub async fn login<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<(CookieJar, Response), AppError> {
    let outcome = state.auth.login(credentials).await?;
    Ok(finish(&state, jar, outcome))
}

/// `POST /signup`
pub async fn signup<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<(CookieJar, Response), AppError> {
    let outcome = state.auth.signup(credentials).await?;
    Ok(finish(&state, jar, outcome))
}

/// `GET /logout`. Anonymous requests are redirected without side effects.
pub async fn logout<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    context: AuthContext,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let (Some(user), Some(token)) = (&context.user, &context.token) else {
        return Ok((jar, found("/")));
    };

    state.auth.logout(token).await?;
    tracing::info!(username = %user.username, "user logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, found("/")))
}
