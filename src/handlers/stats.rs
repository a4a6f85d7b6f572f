use crate::{
    AppState,
    access,
    auth::AuthUser,
    error::{ApiError, ApiQuery},
    models::{ActiveUser, PlatformStats, PopularCourse, PopularLesson, TopParams, MAX_PAGE_SIZE},
};
use axum::{
    Json,
    extract::State,
};

fn top(params: TopParams) -> i64 {
    params.limit.clamp(0, MAX_PAGE_SIZE)
}

/// platform_stats
///
/// [Admin Route] Row totals and the global average rating.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    responses(
        (status = 200, description = "Platform totals", body = PlatformStats),
        (status = 403, description = "Admin only")
    )
)]
pub async fn platform_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PlatformStats>, ApiError> {
    access::require_admin(&user)?;
    Ok(Json(state.repo.platform_stats().await?))
}

/// popular_courses
///
/// [Admin Route] Courses ranked by number of enrollments.
#[utoipa::path(
    get,
    path = "/api/v1/stats/popular-courses",
    params(TopParams),
    responses(
        (status = 200, description = "Most enrolled courses", body = [PopularCourse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn popular_courses(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TopParams>,
) -> Result<Json<Vec<PopularCourse>>, ApiError> {
    access::require_admin(&user)?;
    Ok(Json(state.repo.popular_courses(top(params)).await?))
}

/// popular_lessons
///
/// [Admin Route] Lessons ranked by comments plus ratings.
#[utoipa::path(
    get,
    path = "/api/v1/stats/popular-lessons",
    params(TopParams),
    responses(
        (status = 200, description = "Most discussed lessons", body = [PopularLesson]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn popular_lessons(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TopParams>,
) -> Result<Json<Vec<PopularLesson>>, ApiError> {
    access::require_admin(&user)?;
    Ok(Json(state.repo.popular_lessons(top(params)).await?))
}

/// active_users
///
/// [Admin Route] Users ranked by enrollments + comments + ratings.
#[utoipa::path(
    get,
    path = "/api/v1/stats/active-users",
    params(TopParams),
    responses(
        (status = 200, description = "Most active users", body = [ActiveUser]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn active_users(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TopParams>,
) -> Result<Json<Vec<ActiveUser>>, ApiError> {
    access::require_admin(&user)?;
    Ok(Json(state.repo.active_users(top(params)).await?))
}
