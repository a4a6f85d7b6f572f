use super::LessonScope;
use crate::{
    AppState,
    access::{self, Action, Resource},
    auth::AuthUser,
    error::{ApiError, ApiJson, ApiPath, ApiQuery},
    models::{CreateRatingRequest, Pagination, Rating, UpdateRatingRequest},
    repository::Repository,
};
use axum::{
    Json,
    extract::State,
};

fn validate_stars(stars: i32) -> Result<i32, ApiError> {
    if (1..=5).contains(&stars) {
        Ok(stars)
    } else {
        Err(ApiError::bad_request("Rating must be between 1 and 5 stars"))
    }
}

async fn find_owned_rating(
    repo: &dyn Repository,
    user: &AuthUser,
    id: i64,
    action: Action,
) -> Result<Rating, ApiError> {
    let rating = repo
        .get_rating(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Rating not found"))?;
    access::authorize(user, Resource::Owned { owner_id: rating.user_id }, action)?;
    Ok(rating)
}

/// list_ratings
///
/// [Authenticated Route] The caller's own ratings; admins see every rating.
#[utoipa::path(
    get,
    path = "/api/v1/ratings",
    params(Pagination),
    responses((status = 200, description = "Ratings", body = [Rating]))
)]
pub async fn list_ratings(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Rating>>, ApiError> {
    let ratings = if user.is_admin {
        state.repo.list_ratings(page).await?
    } else {
        state.repo.list_ratings_by_user(user.id, page).await?
    };
    Ok(Json(ratings))
}

/// rate_lesson
///
/// [Authenticated Route] Creates the caller's rating for a lesson, or replaces the stars
/// of the one they already gave.
#[utoipa::path(
    post,
    path = "/api/v1/ratings",
    request_body = CreateRatingRequest,
    responses(
        (status = 200, description = "Created or updated", body = Rating),
        (status = 400, description = "Stars outside 1..=5"),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn rate_lesson(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateRatingRequest>,
) -> Result<Json<Rating>, ApiError> {
    let stars = validate_stars(payload.stars)?;
    let scope = LessonScope::load(state.repo.as_ref(), &user, payload.lesson_id).await?;
    access::authorize(&user, scope.resource(), Action::Rate)?;

    let rating = state.repo.upsert_rating(user.id, scope.lesson.id, stars).await?;
    tracing::info!(user_id = user.id, lesson_id = scope.lesson.id, stars, "lesson rated");
    Ok(Json(rating))
}

/// list_lesson_ratings
#[utoipa::path(
    get,
    path = "/api/v1/ratings/by-lesson/{lesson_id}",
    params(("lesson_id" = i64, Path, description = "Lesson id"), Pagination),
    responses(
        (status = 200, description = "Ratings of the lesson", body = [Rating]),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn list_lesson_ratings(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(lesson_id): ApiPath<i64>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Rating>>, ApiError> {
    let scope = LessonScope::load(state.repo.as_ref(), &user, lesson_id).await?;
    access::authorize(&user, scope.resource(), Action::Read)?;
    Ok(Json(state.repo.list_ratings_by_lesson(lesson_id, page).await?))
}

/// lesson_average_rating
///
/// [Authenticated Route] Mean star score of a lesson, 0.0 when unrated.
#[utoipa::path(
    get,
    path = "/api/v1/ratings/average/lesson/{lesson_id}",
    params(("lesson_id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Average stars", body = f64),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn lesson_average_rating(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(lesson_id): ApiPath<i64>,
) -> Result<Json<f64>, ApiError> {
    let scope = LessonScope::load(state.repo.as_ref(), &user, lesson_id).await?;
    access::authorize(&user, scope.resource(), Action::Read)?;
    Ok(Json(state.repo.average_rating(lesson_id).await?))
}

/// read_rating
#[utoipa::path(
    get,
    path = "/api/v1/ratings/{id}",
    params(("id" = i64, Path, description = "Rating id")),
    responses(
        (status = 200, description = "Rating", body = Rating),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn read_rating(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Rating>, ApiError> {
    Ok(Json(find_owned_rating(state.repo.as_ref(), &user, id, Action::Read).await?))
}

/// update_rating
#[utoipa::path(
    put,
    path = "/api/v1/ratings/{id}",
    params(("id" = i64, Path, description = "Rating id")),
    request_body = UpdateRatingRequest,
    responses(
        (status = 200, description = "Updated", body = Rating),
        (status = 400, description = "Stars outside 1..=5"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_rating(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateRatingRequest>,
) -> Result<Json<Rating>, ApiError> {
    let stars = payload.stars.map(validate_stars).transpose()?;
    find_owned_rating(state.repo.as_ref(), &user, id, Action::Update).await?;

    let updated = state
        .repo
        .update_rating(id, stars)
        .await?
        .ok_or_else(|| ApiError::not_found("Rating not found"))?;
    Ok(Json(updated))
}

/// delete_rating
#[utoipa::path(
    delete,
    path = "/api/v1/ratings/{id}",
    params(("id" = i64, Path, description = "Rating id")),
    responses(
        (status = 200, description = "Deleted rating", body = Rating),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_rating(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Rating>, ApiError> {
    find_owned_rating(state.repo.as_ref(), &user, id, Action::Delete).await?;

    let deleted = state
        .repo
        .delete_rating(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Rating not found"))?;
    tracing::info!(user_id = user.id, rating_id = id, "rating deleted");
    Ok(Json(deleted))
}
