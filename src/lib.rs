use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod seed;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::{API_V1_STR, AppConfig};
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI document for every handler decorated with
/// `#[utoipa::path]`. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login::login_access_token, handlers::login::login_json, handlers::login::test_token,
        handlers::login::register,
        handlers::users::read_me, handlers::users::update_me, handlers::users::list_users,
        handlers::users::create_user, handlers::users::read_user, handlers::users::update_user,
        handlers::users::delete_user,
        handlers::courses::list_courses, handlers::courses::list_my_courses, handlers::courses::create_course,
        handlers::courses::read_course, handlers::courses::update_course, handlers::courses::delete_course,
        handlers::courses::enroll_in_course,
        handlers::lessons::list_lessons, handlers::lessons::create_lesson, handlers::lessons::read_lesson,
        handlers::lessons::update_lesson, handlers::lessons::delete_lesson,
        handlers::comments::list_comments, handlers::comments::create_comment,
        handlers::comments::list_lesson_comments, handlers::comments::read_comment,
        handlers::comments::update_comment, handlers::comments::delete_comment,
        handlers::ratings::list_ratings, handlers::ratings::rate_lesson, handlers::ratings::list_lesson_ratings,
        handlers::ratings::lesson_average_rating, handlers::ratings::read_rating,
        handlers::ratings::update_rating, handlers::ratings::delete_rating,
        handlers::enrollments::list_enrollments, handlers::enrollments::create_enrollment,
        handlers::enrollments::list_course_members, handlers::enrollments::read_enrollment,
        handlers::enrollments::update_enrollment, handlers::enrollments::delete_enrollment,
        handlers::stats::platform_stats, handlers::stats::popular_courses, handlers::stats::popular_lessons,
        handlers::stats::active_users,
        handlers::admin::admin_index, handlers::admin::admin_users, handlers::admin::admin_courses,
        handlers::admin::admin_lessons, handlers::admin::admin_enrollments, handlers::admin::admin_comments,
        handlers::admin::admin_ratings, handlers::admin::admin_login_form, handlers::admin::admin_login,
        handlers::admin::admin_logout, handlers::admin::admin_dashboard
    ),
    components(
        schemas(
            models::UserProfile, models::Course, models::Lesson, models::Comment, models::Rating,
            models::Enrollment, models::CourseWithLessons, models::LessonWithDetails, models::Token,
            models::LoginRequest, models::RegisterRequest, models::CreateUserRequest,
            models::UpdateUserRequest, models::CreateCourseRequest, models::UpdateCourseRequest,
            models::CreateLessonRequest, models::UpdateLessonRequest, models::CreateCommentRequest,
            models::UpdateCommentRequest, models::CreateRatingRequest, models::UpdateRatingRequest,
            models::CreateEnrollmentRequest, models::UpdateEnrollmentRequest, models::PlatformStats,
            models::PopularCourse, models::PopularLesson, models::ActiveUser, models::DashboardCounts,
            models::AdminDashboard, models::AdminOverview, error::ErrorBody,
        )
    ),
    tags(
        (name = "learning-platform", description = "Courses, lessons, comments, ratings and enrollments API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single, immutable container holding the application's services and
/// configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Postgres in production, in-memory locally and in tests.
    pub repo: RepositoryState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These let extractors such as `AuthUser` pull single components from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for protected routers. Extracting `AuthUser` rejects the
/// request (401, or 400 for inactive accounts) before the handler runs; on success the
/// resolved user is cached in the request extensions for the handler's own extractor.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// api_routes
///
/// Every JSON endpoint, relative to [`API_V1_STR`].
fn api_routes(state: &AppState) -> Router<AppState> {
    let auth_layer = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes().route_layer(auth_layer()))
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(auth_layer())
                .merge(admin::admin_session_routes()),
        )
}

/// create_router
///
/// Assembles the application's routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Unauthenticated liveness check.
        .route("/health", get(|| async { "ok" }))
        .nest(API_V1_STR, api_routes(&state))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a span.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Used by `TraceLayer` to build the per-request span. Includes the `x-request-id`
/// header (if present) alongside the HTTP method and URI so every log line of a
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
