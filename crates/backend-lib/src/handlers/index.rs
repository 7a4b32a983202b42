// ============================
// crates/backend-lib/src/handlers/index.rs
// ============================
//! Landing page.
use axum::{extract::Query, response::Html};
use serde::Deserialize;

use crate::middleware::AuthContext;
use crate::storage::User;

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    #[serde(rename = "authError")]
    pub auth_error: Option<String>,
}

impl IndexQuery {
    /// `"true"` is the redirect target of a failed login; any other value is
    /// echoed back as is.
    pub fn message(&self) -> Option<&str> {
        match self.auth_error.as_deref() {
            Some("true") => Some("Wrong username or password"),
            other => other,
        }
    }
}

/// `GET /`
pub async fn index(context: AuthContext, Query(query): Query<IndexQuery>) -> Html<String> {
    Html(render(context.user.as_ref(), query.message()))
}

fn render(user: Option<&User>, auth_error: Option<&str>) -> String {
    let mut body = String::new();

    if let Some(message) = auth_error {
        body.push_str(&format!(
            "<p class=\"error\">{}</p>\n",
            html_escape::encode_text(message)
        ));
    }

    match user {
        Some(user) => {
            body.push_str(&format!(
                "<p>Signed in as <strong>{}</strong></p>\n<p>Books: <span id=\"books\">{}</span></p>\n",
                html_escape::encode_text(&user.username),
                user.books
            ));
            body.push_str(
                "<button id=\"add-book\" onclick=\"fetch('/api/add-book',{method:'POST'}).then(r=>r.json()).then(d=>{document.getElementById('books').textContent=d.books})\">Add book</button>\n",
            );
            body.push_str("<p><a href=\"/logout\">Log out</a></p>\n");
        },
        None => {
            body.push_str(&credentials_form("/login", "Log in"));
            body.push_str(&credentials_form("/signup", "Sign up"));
        },
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Auth demo</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn credentials_form(action: &str, label: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\n<h2>{label}</h2>\n<input name=\"username\" placeholder=\"Username\">\n<input name=\"password\" type=\"password\" placeholder=\"Password\">\n<button type=\"submit\">{label}</button>\n</form>\n"
    )
}
