use crate::{
    AppState,
    access::{self, Action, Resource},
    auth::{AuthUser, hash_password},
    error::{ApiError, ApiJson, ApiPath, ApiQuery, EMAIL_ALREADY_REGISTERED},
    models::{CreateUserRequest, NewUser, Pagination, UpdateUserRequest, UserChanges, UserProfile},
    repository::Repository,
};
use axum::{
    Json,
    extract::State,
};

/// Rejects an email that already belongs to a different account.
async fn ensure_email_free(repo: &dyn Repository, email: &str, owner: Option<i64>) -> Result<(), ApiError> {
    match repo.get_user_by_email(email).await? {
        Some(existing) if Some(existing.id) != owner => Err(ApiError::bad_request(EMAIL_ALREADY_REGISTERED)),
        _ => Ok(()),
    }
}

async fn to_changes(repo: &dyn Repository, id: i64, req: UpdateUserRequest) -> Result<UserChanges, ApiError> {
    if let Some(email) = &req.email {
        ensure_email_free(repo, email, Some(id)).await?;
    }
    let hashed_password = match &req.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    Ok(UserChanges {
        full_name: req.full_name,
        email: req.email,
        hashed_password,
        is_active: req.is_active,
        is_admin: req.is_admin,
    })
}

/// read_me
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses((status = 200, description = "Current user", body = UserProfile))
)]
pub async fn read_me(user: AuthUser) -> Json<UserProfile> {
    Json(user.profile())
}

/// update_me
///
/// [Authenticated Route] Self-service profile update. Role and status flags in the
/// payload are ignored.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Email already taken")
    )
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let payload = UpdateUserRequest {
        is_active: None,
        is_admin: None,
        ..payload
    };
    let changes = to_changes(state.repo.as_ref(), user.id, payload).await?;
    let updated = state
        .repo
        .update_user(user.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(updated.into()))
}

/// list_users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(Pagination),
    responses(
        (status = 200, description = "All users", body = [UserProfile]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    access::require_admin(&user)?;
    let users = state.repo.list_users(page).await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// create_user
///
/// [Admin Route] Creates an account with explicit role and status flags.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Created", body = UserProfile),
        (status = 400, description = "Email already registered"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_user(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    access::require_admin(&user)?;
    ensure_email_free(state.repo.as_ref(), &payload.email, None).await?;

    let created = state
        .repo
        .create_user(NewUser {
            full_name: payload.full_name,
            email: payload.email,
            hashed_password: hash_password(&payload.password)?,
            is_active: payload.is_active,
            is_admin: payload.is_admin,
        })
        .await?;

    tracing::info!(admin_id = user.id, user_id = created.id, "admin created user");
    Ok(Json(created.into()))
}

/// read_user
///
/// [Authenticated Route] Users may read their own account; admins any account.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserProfile),
        (status = 403, description = "Not enough privileges"),
        (status = 404, description = "Not found")
    )
)]
pub async fn read_user(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    access::authorize(&user, Resource::Account { user_id: id }, Action::Read)?;
    let found = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(found.into()))
}

/// update_user
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    access::require_admin(&user)?;
    if state.repo.get_user(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let changes = to_changes(state.repo.as_ref(), id, payload).await?;
    let updated = state
        .repo
        .update_user(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(updated.into()))
}

/// delete_user
///
/// [Admin Route] Removes an account and, through the cascade, everything it owns.
/// Admins cannot delete their own account.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted user", body = UserProfile),
        (status = 403, description = "Admin only / self-deletion"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    access::authorize(&user, Resource::Account { user_id: id }, Action::Delete)?;
    if id == user.id {
        return Err(ApiError::forbidden("Super users are not allowed to delete themselves"));
    }

    let deleted = state
        .repo
        .delete_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(admin_id = user.id, user_id = id, "deleted user");
    Ok(Json(deleted.into()))
}
