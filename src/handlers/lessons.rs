use super::{LessonScope, find_course};
use crate::{
    AppState,
    access::{self, Action, Resource},
    auth::AuthUser,
    error::{ApiError, ApiJson, ApiPath, ApiQuery},
    models::{CreateLessonRequest, Lesson, LessonWithDetails, Pagination, UpdateLessonRequest},
};
use axum::{
    Json,
    extract::State,
};

/// list_lessons
#[utoipa::path(
    get,
    path = "/api/v1/lessons",
    params(Pagination),
    responses((status = 200, description = "Lessons", body = [Lesson]))
)]
pub async fn list_lessons(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    Ok(Json(state.repo.list_lessons(page).await?))
}

/// create_lesson
///
/// [Authenticated Route] Only the course's author may add lessons to it.
#[utoipa::path(
    post,
    path = "/api/v1/lessons",
    request_body = CreateLessonRequest,
    responses(
        (status = 200, description = "Created", body = Lesson),
        (status = 403, description = "Not the course author"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn create_lesson(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateLessonRequest>,
) -> Result<Json<Lesson>, ApiError> {
    let course = find_course(state.repo.as_ref(), payload.course_id).await?;
    access::authorize(
        &user,
        Resource::CourseContent {
            course: &course,
            enrolled: false,
        },
        Action::Create,
    )?;

    let lesson = state.repo.create_lesson(payload).await?;
    tracing::info!(user_id = user.id, course_id = course.id, lesson_id = lesson.id, "lesson created");
    Ok(Json(lesson))
}

/// read_lesson
///
/// [Authenticated Route] Lesson detail with comments, ratings and the average score.
/// Requires enrollment in the course unless the caller authored it.
#[utoipa::path(
    get,
    path = "/api/v1/lessons/{id}",
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson with details", body = LessonWithDetails),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Not found")
    )
)]
pub async fn read_lesson(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<LessonWithDetails>, ApiError> {
    let scope = LessonScope::load(state.repo.as_ref(), &user, id).await?;
    access::authorize(&user, scope.resource(), Action::Read)?;

    let comments = state.repo.list_comments_of_lesson(id).await?;
    let ratings = state.repo.list_ratings_of_lesson(id).await?;
    let average_rating = state.repo.average_rating(id).await?;

    Ok(Json(LessonWithDetails {
        lesson: scope.lesson,
        comments,
        ratings,
        average_rating,
    }))
}

/// update_lesson
#[utoipa::path(
    put,
    path = "/api/v1/lessons/{id}",
    params(("id" = i64, Path, description = "Lesson id")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Updated", body = Lesson),
        (status = 403, description = "Not the course author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_lesson(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateLessonRequest>,
) -> Result<Json<Lesson>, ApiError> {
    let scope = LessonScope::load(state.repo.as_ref(), &user, id).await?;
    access::authorize(&user, scope.resource(), Action::Update)?;

    let updated = state
        .repo
        .update_lesson(id, payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;
    Ok(Json(updated))
}

/// delete_lesson
///
/// [Authenticated Route] Removes the lesson along with its comments and ratings.
#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{id}",
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Deleted lesson", body = Lesson),
        (status = 403, description = "Not the course author"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_lesson(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Lesson>, ApiError> {
    let scope = LessonScope::load(state.repo.as_ref(), &user, id).await?;
    access::authorize(&user, scope.resource(), Action::Delete)?;

    let deleted = state
        .repo
        .delete_lesson(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;

    tracing::info!(user_id = user.id, lesson_id = id, "lesson deleted");
    Ok(Json(deleted))
}
