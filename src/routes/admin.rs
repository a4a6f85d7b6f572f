use crate::{AppState, handlers::admin};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// JSON listings of every table, restricted to administrators. Mounted under `/admin`
/// behind the authentication layer; each handler then checks the admin flag.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Index of the listings below.
        .route("/", get(admin::admin_index))
        .route("/users", get(admin::admin_users))
        // Courses with their lessons embedded.
        .route("/courses", get(admin::admin_courses))
        // Lessons with comments, ratings and average embedded.
        .route("/lessons", get(admin::admin_lessons))
        .route("/enrollments", get(admin::admin_enrollments))
        .route("/comments", get(admin::admin_comments))
        .route("/ratings", get(admin::admin_ratings))
}

/// Admin Session Routes
///
/// Browser-facing cookie session. These must stay outside the authentication layer:
/// the dashboard resolves the cookie itself and redirects to the login form on failure.
pub fn admin_session_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /admin/login
        // HTML form; the POST sets the `access_token` cookie and redirects (303).
        .route("/login", get(admin::admin_login_form).post(admin::admin_login))
        // GET /admin/logout
        .route("/logout", get(admin::admin_logout))
        // GET /admin/dashboard
        .route("/dashboard", get(admin::admin_dashboard))
}
