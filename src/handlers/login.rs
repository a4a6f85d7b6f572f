use crate::{
    AppState,
    auth::{AuthUser, authenticate, create_access_token, hash_password},
    error::{ApiError, ApiForm, ApiJson, EMAIL_ALREADY_REGISTERED},
    models::{LoginRequest, NewUser, RegisterRequest, Token, UserProfile},
};
use axum::{Json, extract::State};

fn bearer(access_token: String) -> Token {
    Token {
        access_token,
        token_type: "bearer".to_string(),
        ..Default::default()
    }
}

/// login_access_token
///
/// [Public Route] OAuth2-style password login. Takes a form with `username` (the email)
/// and `password` and returns a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/login/access-token",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = Token),
        (status = 400, description = "Incorrect email or password / inactive user")
    )
)]
pub async fn login_access_token(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginRequest>,
) -> Result<Json<Token>, ApiError> {
    let user = authenticate(state.repo.as_ref(), &form.username, &form.password).await?;
    let token = create_access_token(
        user.id,
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )?;

    tracing::info!(user_id = user.id, "issued access token");
    Ok(Json(bearer(token)))
}

/// login_json
///
/// [Public Route] JSON variant of the password login. The response also carries the
/// ready-made `Authorization` value, the user id and the admin flag.
#[utoipa::path(
    post,
    path = "/api/v1/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = Token),
        (status = 400, description = "Incorrect email or password / inactive user")
    )
)]
pub async fn login_json(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<Token>, ApiError> {
    let user = authenticate(state.repo.as_ref(), &payload.username, &payload.password).await?;
    let access_token = create_access_token(
        user.id,
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )?;

    tracing::info!(user_id = user.id, "issued access token");
    Ok(Json(Token {
        bearer_format: Some(format!("Bearer {access_token}")),
        user_id: Some(user.id),
        is_admin: Some(user.is_admin),
        ..bearer(access_token)
    }))
}

/// test_token
///
/// [Authenticated Route] Echoes the profile behind the presented token.
#[utoipa::path(
    post,
    path = "/api/v1/login/test-token",
    responses((status = 200, description = "Token is valid", body = UserProfile))
)]
pub async fn test_token(user: AuthUser) -> Json<UserProfile> {
    Json(user.profile())
}

/// register
///
/// [Public Route] Self-registration. The new account is active and never an admin.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = UserProfile),
        (status = 400, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if state.repo.get_user_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::bad_request(EMAIL_ALREADY_REGISTERED));
    }

    let user = state
        .repo
        .create_user(NewUser {
            full_name: payload.full_name,
            email: payload.email,
            hashed_password: hash_password(&payload.password)?,
            is_active: true,
            is_admin: false,
        })
        .await?;

    tracing::info!(user_id = user.id, "registered new user");
    Ok(Json(user.into()))
}
