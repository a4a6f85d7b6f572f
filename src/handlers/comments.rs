use super::LessonScope;
use crate::{
    AppState,
    access::{self, Action, Resource},
    auth::AuthUser,
    error::{ApiError, ApiJson, ApiPath, ApiQuery},
    models::{Comment, CreateCommentRequest, Pagination, UpdateCommentRequest},
    repository::Repository,
};
use axum::{
    Json,
    extract::State,
};

async fn find_owned_comment(
    repo: &dyn Repository,
    user: &AuthUser,
    id: i64,
    action: Action,
) -> Result<Comment, ApiError> {
    let comment = repo
        .get_comment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    access::authorize(user, Resource::Owned { owner_id: comment.user_id }, action)?;
    Ok(comment)
}

/// list_comments
///
/// [Authenticated Route] The caller's own comments; admins see every comment.
#[utoipa::path(
    get,
    path = "/api/v1/comments",
    params(Pagination),
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn list_comments(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = if user.is_admin {
        state.repo.list_comments(page).await?
    } else {
        state.repo.list_comments_by_user(user.id, page).await?
    };
    Ok(Json(comments))
}

/// create_comment
///
/// [Authenticated Route] Requires enrollment in the lesson's course, or authorship.
#[utoipa::path(
    post,
    path = "/api/v1/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Created", body = Comment),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let scope = LessonScope::load(state.repo.as_ref(), &user, payload.lesson_id).await?;
    access::authorize(&user, scope.resource(), Action::Comment)?;

    let comment = state
        .repo
        .create_comment(user.id, scope.lesson.id, payload.text)
        .await?;
    tracing::info!(user_id = user.id, lesson_id = scope.lesson.id, comment_id = comment.id, "comment added");
    Ok(Json(comment))
}

/// list_lesson_comments
#[utoipa::path(
    get,
    path = "/api/v1/comments/by-lesson/{lesson_id}",
    params(("lesson_id" = i64, Path, description = "Lesson id"), Pagination),
    responses(
        (status = 200, description = "Comments on the lesson", body = [Comment]),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn list_lesson_comments(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(lesson_id): ApiPath<i64>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let scope = LessonScope::load(state.repo.as_ref(), &user, lesson_id).await?;
    access::authorize(&user, scope.resource(), Action::Read)?;
    Ok(Json(state.repo.list_comments_by_lesson(lesson_id, page).await?))
}

/// read_comment
#[utoipa::path(
    get,
    path = "/api/v1/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn read_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(find_owned_comment(state.repo.as_ref(), &user, id, Action::Read).await?))
}

/// update_comment
#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    find_owned_comment(state.repo.as_ref(), &user, id, Action::Update).await?;

    let updated = state
        .repo
        .update_comment(id, payload.text)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    Ok(Json(updated))
}

/// delete_comment
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Deleted comment", body = Comment),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Comment>, ApiError> {
    find_owned_comment(state.repo.as_ref(), &user, id, Action::Delete).await?;

    let deleted = state
        .repo
        .delete_comment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    tracing::info!(user_id = user.id, comment_id = id, "comment deleted");
    Ok(Json(deleted))
}
