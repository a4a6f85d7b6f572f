use crate::{
    AppState,
    handlers::{comments, courses, enrollments, lessons, login, ratings, stats, users},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` layer, so handlers always receive
/// a validated `AuthUser`. Finer rules (authorship, enrollment, creator-only, admin-only)
/// are enforced in the handlers through `access::authorize`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /login/test-token
        // Returns the profile behind the presented credential.
        .route("/login/test-token", post(login::test_token))
        // --- Accounts ---
        .route("/users/me", get(users::read_me).put(users::update_me))
        // Admin-only account management.
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::read_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // --- Courses ---
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route("/courses/by-author/me", get(courses::list_my_courses))
        // PUT/DELETE are author-only.
        .route(
            "/courses/{id}",
            get(courses::read_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        // POST /courses/{id}/enroll
        // Idempotent: enrolling twice returns the existing record.
        .route("/courses/{id}/enroll", post(courses::enroll_in_course))
        // --- Lessons ---
        .route("/lessons", get(lessons::list_lessons).post(lessons::create_lesson))
        // GET requires enrollment or authorship; PUT/DELETE authorship.
        .route(
            "/lessons/{id}",
            get(lessons::read_lesson)
                .put(lessons::update_lesson)
                .delete(lessons::delete_lesson),
        )
        // --- Comments ---
        .route("/comments", get(comments::list_comments).post(comments::create_comment))
        .route("/comments/by-lesson/{lesson_id}", get(comments::list_lesson_comments))
        .route(
            "/comments/{id}",
            get(comments::read_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        // --- Ratings ---
        // POST upserts on (user, lesson).
        .route("/ratings", get(ratings::list_ratings).post(ratings::rate_lesson))
        .route("/ratings/by-lesson/{lesson_id}", get(ratings::list_lesson_ratings))
        .route(
            "/ratings/average/lesson/{lesson_id}",
            get(ratings::lesson_average_rating),
        )
        .route(
            "/ratings/{id}",
            get(ratings::read_rating)
                .put(ratings::update_rating)
                .delete(ratings::delete_rating),
        )
        // --- Enrollments ---
        .route(
            "/enrollments",
            get(enrollments::list_enrollments).post(enrollments::create_enrollment),
        )
        .route(
            "/enrollments/by-course/{course_id}",
            get(enrollments::list_course_members),
        )
        .route(
            "/enrollments/{id}",
            get(enrollments::read_enrollment)
                .put(enrollments::update_enrollment)
                .delete(enrollments::delete_enrollment),
        )
        // --- Statistics (admin-only) ---
        .route("/stats", get(stats::platform_stats))
        .route("/stats/popular-courses", get(stats::popular_courses))
        .route("/stats/popular-lessons", get(stats::popular_lessons))
        .route("/stats/active-users", get(stats::active_users))
}
