use crate::{
    error::RepositoryError,
    models::{
        ActiveUser, Comment, Course, CreateCourseRequest, CreateLessonRequest, DashboardCounts,
        Enrollment, Lesson, NewUser, Pagination, PlatformStats, PopularCourse, PopularLesson, Rating,
        UpdateCourseRequest, UpdateLessonRequest, User, UserChanges,
    },
};
use async_trait::async_trait;
use std::sync::Arc;

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Abstract contract for every persistence operation, letting handlers work against
/// Postgres in production and the in-memory store in local runs and tests.
///
/// Conventions shared by all implementations:
/// - `get_*` / `update_*` / `delete_*` return `None` when the row does not exist.
/// - `delete_*` returns the row as it was before removal; dependants go with it.
/// - `list_*` return rows ordered by id and windowed by [`Pagination`].
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // Used by the admin login form, which accepts a full name as username.
    async fn get_user_by_full_name(&self, full_name: &str) -> RepoResult<Option<User>>;
    async fn list_users(&self, page: Pagination) -> RepoResult<Vec<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>>;
    async fn delete_user(&self, id: i64) -> RepoResult<Option<User>>;

    // --- Courses ---
    async fn get_course(&self, id: i64) -> RepoResult<Option<Course>>;
    // Case-insensitive substring match on title when `title` is given.
    async fn list_courses(&self, title: Option<&str>, page: Pagination) -> RepoResult<Vec<Course>>;
    async fn list_courses_by_author(&self, author_id: i64, page: Pagination) -> RepoResult<Vec<Course>>;
    async fn create_course(&self, author_id: i64, req: CreateCourseRequest) -> RepoResult<Course>;
    async fn update_course(&self, id: i64, req: UpdateCourseRequest) -> RepoResult<Option<Course>>;
    async fn delete_course(&self, id: i64) -> RepoResult<Option<Course>>;

    // --- Lessons ---
    async fn get_lesson(&self, id: i64) -> RepoResult<Option<Lesson>>;
    async fn list_lessons(&self, page: Pagination) -> RepoResult<Vec<Lesson>>;
    async fn list_lessons_by_course(&self, course_id: i64) -> RepoResult<Vec<Lesson>>;
    async fn create_lesson(&self, req: CreateLessonRequest) -> RepoResult<Lesson>;
    async fn update_lesson(&self, id: i64, req: UpdateLessonRequest) -> RepoResult<Option<Lesson>>;
    async fn delete_lesson(&self, id: i64) -> RepoResult<Option<Lesson>>;

    // --- Comments ---
    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    async fn list_comments(&self, page: Pagination) -> RepoResult<Vec<Comment>>;
    async fn list_comments_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Comment>>;
    async fn list_comments_by_lesson(&self, lesson_id: i64, page: Pagination) -> RepoResult<Vec<Comment>>;
    // Every comment of the lesson, unwindowed. Used by the lesson detail views.
    async fn list_comments_of_lesson(&self, lesson_id: i64) -> RepoResult<Vec<Comment>>;
    async fn create_comment(&self, user_id: i64, lesson_id: i64, text: String) -> RepoResult<Comment>;
    async fn update_comment(&self, id: i64, text: Option<String>) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> RepoResult<Option<Comment>>;

    // --- Ratings ---
    async fn get_rating(&self, id: i64) -> RepoResult<Option<Rating>>;
    async fn list_ratings(&self, page: Pagination) -> RepoResult<Vec<Rating>>;
    async fn list_ratings_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Rating>>;
    async fn list_ratings_by_lesson(&self, lesson_id: i64, page: Pagination) -> RepoResult<Vec<Rating>>;
    async fn list_ratings_of_lesson(&self, lesson_id: i64) -> RepoResult<Vec<Rating>>;
    // Creates the (user, lesson) rating or overwrites its stars when it already exists.
    async fn upsert_rating(&self, user_id: i64, lesson_id: i64, stars: i32) -> RepoResult<Rating>;
    async fn update_rating(&self, id: i64, stars: Option<i32>) -> RepoResult<Option<Rating>>;
    async fn delete_rating(&self, id: i64) -> RepoResult<Option<Rating>>;
    // 0.0 for a lesson nobody has rated.
    async fn average_rating(&self, lesson_id: i64) -> RepoResult<f64>;

    // --- Enrollments ---
    async fn get_enrollment(&self, id: i64) -> RepoResult<Option<Enrollment>>;
    async fn find_enrollment(&self, user_id: i64, course_id: i64) -> RepoResult<Option<Enrollment>>;
    async fn list_enrollments(&self, page: Pagination) -> RepoResult<Vec<Enrollment>>;
    async fn list_enrollments_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Enrollment>>;
    // Idempotent: returns the existing enrollment for (user, course) if there is one.
    async fn enroll(&self, user_id: i64, course_id: i64) -> RepoResult<Enrollment>;
    async fn update_enrollment(&self, id: i64, course_id: Option<i64>) -> RepoResult<Option<Enrollment>>;
    async fn delete_enrollment(&self, id: i64) -> RepoResult<Option<Enrollment>>;
    async fn list_enrolled_users(&self, course_id: i64, page: Pagination) -> RepoResult<Vec<User>>;

    // --- Statistics ---
    async fn platform_stats(&self) -> RepoResult<PlatformStats>;
    async fn dashboard_counts(&self) -> RepoResult<DashboardCounts>;
    async fn popular_courses(&self, limit: i64) -> RepoResult<Vec<PopularCourse>>;
    async fn popular_lessons(&self, limit: i64) -> RepoResult<Vec<PopularLesson>>;
    async fn active_users(&self, limit: i64) -> RepoResult<Vec<ActiveUser>>;
    // Most recently created rows first.
    async fn recent_courses(&self, limit: i64) -> RepoResult<Vec<Course>>;
    async fn recent_users(&self, limit: i64) -> RepoResult<Vec<User>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
