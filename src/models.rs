use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

/// Upper bound applied to every `limit` query parameter.
pub const MAX_PAGE_SIZE: i64 = 100;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical account row from the `users` table. Never serialized directly:
/// responses go through [`UserProfile`] so the password hash stays server-side.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    // Unique login identifier.
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_admin: bool,
}

/// UserProfile
///
/// Public view of a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
        }
    }
}

/// Course
///
/// A course from the `courses` table, owned by its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    // FK to users.id (Owner).
    pub author_id: i64,
}

/// Lesson
///
/// A lesson belongs to exactly one course and inherits its ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub video_url: Option<String>,
    pub content: Option<String>,
}

/// Comment
///
/// A comment left by a user on a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub text: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Rating
///
/// A 1–5 star score. At most one row exists per (user, lesson); creating a second
/// rating updates the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub stars: i32,
}

/// Enrollment
///
/// Join record granting a user access to a course's lessons. Unique per (user, course).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    #[ts(type = "string")]
    pub enrolled_at: DateTime<Utc>,
}

// --- Composite Responses ---

/// CourseWithLessons
///
/// Course detail view: the course fields plus its lessons.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CourseWithLessons {
    #[serde(flatten)]
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

/// LessonWithDetails
///
/// Lesson detail view with its comments, ratings and average star score
/// (0.0 when nobody has rated it yet).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LessonWithDetails {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub comments: Vec<Comment>,
    pub ratings: Vec<Rating>,
    pub average_rating: f64,
}

// --- Authentication Payloads ---

/// Token
///
/// Output of the login endpoints. The optional fields are only filled by `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

/// LoginRequest
///
/// Credentials for the token endpoints and the admin login form. `username` holds the email
/// (the admin form also accepts the full name).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// RegisterRequest
///
/// Public self-registration payload. Accounts created this way are never admins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

// --- Request Payloads (Input Schemas) ---

/// CreateUserRequest
///
/// Admin-side account creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// UpdateUserRequest
///
/// Partial account update. `is_active` and `is_admin` are ignored when a user edits
/// their own account through `/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

/// CreateCourseRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// UpdateCourseRequest
///
/// Partial update: absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CreateLessonRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateLessonRequest {
    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// UpdateLessonRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateLessonRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// CreateCommentRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateCommentRequest {
    pub lesson_id: i64,
    pub text: String,
}

/// UpdateCommentRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// CreateRatingRequest
///
/// Creates or replaces the caller's rating for a lesson.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateRatingRequest {
    pub lesson_id: i64,
    #[schema(minimum = 1, maximum = 5)]
    pub stars: i32,
}

/// UpdateRatingRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateRatingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(minimum = 1, maximum = 5)]
    pub stars: Option<i32>,
}

/// CreateEnrollmentRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateEnrollmentRequest {
    pub course_id: i64,
}

/// UpdateEnrollmentRequest
///
/// Moves an enrollment to another course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateEnrollmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
}

// --- Repository Inputs ---

/// A fully validated account ready for insertion (password already hashed).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_admin: bool,
}

/// Column-level account changes; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

// --- Query Parameters ---

/// Pagination
///
/// `skip`/`limit` window applied to every list endpoint.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Number of rows to skip.
    #[serde(default)]
    pub skip: i64,
    /// Maximum number of rows to return (capped at 100).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    MAX_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: MAX_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }

    pub fn offset(&self) -> i64 {
        self.skip.max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(0, MAX_PAGE_SIZE)
    }

    /// Applies the window to an already ordered in-memory sequence.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit() as usize)
            .collect()
    }
}

/// CourseFilter
///
/// Query parameters for `GET /courses`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilter {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Case-insensitive substring match on the course title.
    pub title: Option<String>,
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: MAX_PAGE_SIZE,
            title: None,
        }
    }
}

impl CourseFilter {
    pub fn page(&self) -> Pagination {
        Pagination::new(self.skip, self.limit)
    }
}

/// TopParams
///
/// `limit` for the ranking endpoints under `/stats`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopParams {
    #[serde(default = "default_top")]
    pub limit: i64,
}

fn default_top() -> i64 {
    5
}

impl Default for TopParams {
    fn default() -> Self {
        Self { limit: default_top() }
    }
}

// --- Dashboard & Statistics Schemas (Output) ---

/// PlatformStats
///
/// Output of `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_courses: i64,
    pub total_lessons: i64,
    pub total_comments: i64,
    pub total_ratings: i64,
    /// Mean of every rating in the system, 0.0 when there are none.
    pub average_rating: f64,
}

/// PopularCourse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PopularCourse {
    pub id: i64,
    pub title: String,
    pub enrollment_count: i64,
}

/// PopularLesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PopularLesson {
    pub id: i64,
    pub title: String,
    pub comment_count: i64,
    pub rating_count: i64,
    pub avg_rating: f64,
}

/// ActiveUser
///
/// A user ranked by `activity_score = enrollments + comments + ratings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ActiveUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub enrollment_count: i64,
    pub comment_count: i64,
    pub rating_count: i64,
    pub activity_score: i64,
}

/// DashboardCounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardCounts {
    pub users_count: i64,
    pub courses_count: i64,
    pub lessons_count: i64,
    pub enrollments_count: i64,
}

/// AdminDashboard
///
/// Payload of the cookie-authenticated `GET /admin/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminDashboard {
    pub user: UserProfile,
    pub stats: DashboardCounts,
    pub recent_courses: Vec<Course>,
    pub recent_users: Vec<UserProfile>,
}

/// AdminOverview
///
/// Index of the admin JSON endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminOverview {
    pub message: String,
    pub endpoints: BTreeMap<String, String>,
}
