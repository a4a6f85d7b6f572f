use super::find_course;
use crate::{
    AppState,
    access::{self, Action, Resource},
    auth::AuthUser,
    error::{ApiError, ApiJson, ApiPath, ApiQuery},
    models::{
        Course, CourseFilter, CourseWithLessons, CreateCourseRequest, Enrollment, Pagination,
        UpdateCourseRequest,
    },
};
use axum::{
    Json,
    extract::State,
};

/// list_courses
///
/// [Authenticated Route] Lists every course, optionally filtered by a case-insensitive
/// title fragment.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(CourseFilter),
    responses((status = 200, description = "Courses", body = [Course]))
)]
pub async fn list_courses(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CourseFilter>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let title = filter.title.as_deref().filter(|t| !t.is_empty());
    let courses = state.repo.list_courses(title, filter.page()).await?;
    Ok(Json(courses))
}

/// list_my_courses
///
/// [Authenticated Route] Courses authored by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/courses/by-author/me",
    params(Pagination),
    responses((status = 200, description = "My courses", body = [Course]))
)]
pub async fn list_my_courses(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let courses = state.repo.list_courses_by_author(user.id, page).await?;
    Ok(Json(courses))
}

/// create_course
///
/// [Authenticated Route] Any user may create a course and becomes its author.
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CreateCourseRequest,
    responses((status = 200, description = "Created", body = Course))
)]
pub async fn create_course(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    let course = state.repo.create_course(user.id, payload).await?;
    tracing::info!(user_id = user.id, course_id = course.id, "course created");
    Ok(Json(course))
}

/// read_course
///
/// [Authenticated Route] Course detail with its lessons embedded.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with lessons", body = CourseWithLessons),
        (status = 404, description = "Not found")
    )
)]
pub async fn read_course(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CourseWithLessons>, ApiError> {
    let course = find_course(state.repo.as_ref(), id).await?;
    access::authorize(&user, Resource::Course(&course), Action::Read)?;

    let lessons = state.repo.list_lessons_by_course(course.id).await?;
    Ok(Json(CourseWithLessons { course, lessons }))
}

/// update_course
///
/// [Authenticated Route] Author-only partial update.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_course(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    let course = find_course(state.repo.as_ref(), id).await?;
    access::authorize(&user, Resource::Course(&course), Action::Update)?;

    let updated = state
        .repo
        .update_course(id, payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
    Ok(Json(updated))
}

/// delete_course
///
/// [Authenticated Route] Author-only. Lessons, their comments and ratings, and the
/// course's enrollments are removed with it.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Deleted course", body = Course),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_course(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Course>, ApiError> {
    let course = find_course(state.repo.as_ref(), id).await?;
    access::authorize(&user, Resource::Course(&course), Action::Delete)?;

    let deleted = state
        .repo
        .delete_course(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    tracing::info!(user_id = user.id, course_id = id, "course deleted");
    Ok(Json(deleted))
}

/// enroll_in_course
///
/// [Authenticated Route] Enrolls the caller. Enrolling twice returns the existing record.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrollment", body = Enrollment),
        (status = 404, description = "Course not found")
    )
)]
pub async fn enroll_in_course(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Enrollment>, ApiError> {
    let course = find_course(state.repo.as_ref(), id).await?;
    let enrollment = state.repo.enroll(user.id, course.id).await?;
    tracing::info!(user_id = user.id, course_id = course.id, enrollment_id = enrollment.id, "enrolled");
    Ok(Json(enrollment))
}
