use super::find_course;
use crate::{
    AppState,
    access::{self, Action, Resource},
    auth::AuthUser,
    error::{ApiError, ApiJson, ApiPath, ApiQuery},
    models::{CreateEnrollmentRequest, Enrollment, Pagination, UpdateEnrollmentRequest, UserProfile},
    repository::Repository,
};
use axum::{
    Json,
    extract::State,
};

async fn find_owned_enrollment(
    repo: &dyn Repository,
    user: &AuthUser,
    id: i64,
    action: Action,
) -> Result<Enrollment, ApiError> {
    let enrollment = repo
        .get_enrollment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment not found"))?;
    access::authorize(user, Resource::Owned { owner_id: enrollment.user_id }, action)?;
    Ok(enrollment)
}

/// list_enrollments
///
/// [Authenticated Route] The caller's own enrollments; admins see all of them.
#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    params(Pagination),
    responses((status = 200, description = "Enrollments", body = [Enrollment]))
)]
pub async fn list_enrollments(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    let enrollments = if user.is_admin {
        state.repo.list_enrollments(page).await?
    } else {
        state.repo.list_enrollments_by_user(user.id, page).await?
    };
    Ok(Json(enrollments))
}

/// create_enrollment
///
/// [Authenticated Route] Idempotent: a second request for the same course returns the
/// existing enrollment.
#[utoipa::path(
    post,
    path = "/api/v1/enrollments",
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 200, description = "Enrollment", body = Enrollment),
        (status = 404, description = "Course not found")
    )
)]
pub async fn create_enrollment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEnrollmentRequest>,
) -> Result<Json<Enrollment>, ApiError> {
    let course = find_course(state.repo.as_ref(), payload.course_id).await?;
    let enrollment = state.repo.enroll(user.id, course.id).await?;
    tracing::info!(user_id = user.id, course_id = course.id, enrollment_id = enrollment.id, "enrolled");
    Ok(Json(enrollment))
}

/// list_course_members
///
/// [Authenticated Route] Users enrolled in a course. Course author or admin only.
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/by-course/{course_id}",
    params(("course_id" = i64, Path, description = "Course id"), Pagination),
    responses(
        (status = 200, description = "Enrolled users", body = [UserProfile]),
        (status = 403, description = "Not the course author"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn list_course_members(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(course_id): ApiPath<i64>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let course = find_course(state.repo.as_ref(), course_id).await?;
    access::authorize(
        &user,
        Resource::CourseContent {
            course: &course,
            enrolled: false,
        },
        Action::ListMembers,
    )?;

    let users = state.repo.list_enrolled_users(course_id, page).await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// read_enrollment
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{id}",
    params(("id" = i64, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Enrollment", body = Enrollment),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn read_enrollment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Enrollment>, ApiError> {
    Ok(Json(find_owned_enrollment(state.repo.as_ref(), &user, id, Action::Read).await?))
}

/// update_enrollment
///
/// [Authenticated Route] Moves an enrollment to another course. Moving it onto a course
/// its user is already enrolled in is rejected.
#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{id}",
    params(("id" = i64, Path, description = "Enrollment id")),
    request_body = UpdateEnrollmentRequest,
    responses(
        (status = 200, description = "Updated", body = Enrollment),
        (status = 400, description = "Already enrolled in the target course"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Enrollment or course not found")
    )
)]
pub async fn update_enrollment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateEnrollmentRequest>,
) -> Result<Json<Enrollment>, ApiError> {
    let enrollment = find_owned_enrollment(state.repo.as_ref(), &user, id, Action::Update).await?;

    if let Some(course_id) = payload.course_id.filter(|c| *c != enrollment.course_id) {
        find_course(state.repo.as_ref(), course_id).await?;
        if state
            .repo
            .find_enrollment(enrollment.user_id, course_id)
            .await?
            .is_some()
        {
            return Err(ApiError::bad_request("User is already enrolled in this course"));
        }
    }

    let updated = state
        .repo
        .update_enrollment(id, payload.course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment not found"))?;
    Ok(Json(updated))
}

/// delete_enrollment
#[utoipa::path(
    delete,
    path = "/api/v1/enrollments/{id}",
    params(("id" = i64, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Deleted enrollment", body = Enrollment),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_enrollment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Enrollment>, ApiError> {
    find_owned_enrollment(state.repo.as_ref(), &user, id, Action::Delete).await?;

    let deleted = state
        .repo
        .delete_enrollment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment not found"))?;
    tracing::info!(user_id = user.id, enrollment_id = id, "enrollment deleted");
    Ok(Json(deleted))
}
