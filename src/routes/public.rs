use crate::{AppState, handlers::login};
use axum::{Router, routing::post};

/// Public Router Module
///
/// Endpoints that are **unauthenticated** and accessible to any client. They are the
/// gateway into the API: registration and the two token-issuing logins.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /login/access-token
        // OAuth2-style form login (`username` = email, `password`).
        .route("/login/access-token", post(login::login_access_token))
        // POST /token
        // JSON login. Also returns the ready-made `Bearer` value, user id and admin flag.
        .route("/token", post(login::login_json))
        // POST /register
        // Self-registration. Never creates administrators.
        .route("/register", post(login::register))
}
