use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{User, UserProfile},
    repository::{Repository, RepositoryState},
};

/// Name of the cookie carrying the access token for browser sessions.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Claims
///
/// Payload of every access token issued by the service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's numeric id, rendered as a string.
    pub sub: String,
    /// Expiration Time (exp): Timestamp after which the JWT must not be accepted.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the JWT was issued.
    pub iat: usize,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// create_access_token
///
/// Signs an HS256 token whose subject is `user_id` and which expires after `expire_minutes`.
pub fn create_access_token(user_id: i64, secret: &str, expire_minutes: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::minutes(expire_minutes)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("token signing failed: {e}")))
}

/// decode_access_token
///
/// Validates signature and expiry and returns the user id carried in `sub`.
pub fn decode_access_token(token: &str, secret: &str) -> Result<i64, ApiError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
            other => tracing::debug!(reason = ?other, "rejected invalid token"),
        }
        ApiError::unauthorized(INVALID_CREDENTIALS)
    })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| ApiError::unauthorized(INVALID_CREDENTIALS))
}

/// extract_token
///
/// Locates the raw credential of a request. A non-empty `Authorization` header wins and
/// must use the `Bearer` scheme; otherwise the `access_token` cookie is consulted, with
/// an optional `Bearer ` prefix stripped from its value.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value
            .to_str()
            .map_err(|_| ApiError::unauthorized("Not authenticated"))?
            .trim();
        if !raw.is_empty() {
            let token = raw
                .strip_prefix("Bearer ")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
            return Ok(Some(token.to_string()));
        }
    }

    let jar = CookieJar::from_headers(headers);
    Ok(jar.get(ACCESS_TOKEN_COOKIE).and_then(|cookie| {
        let value = cookie.value().trim();
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        (!token.is_empty()).then(|| token.to_string())
    }))
}

/// resolve_token
///
/// Turns a raw token into the active [`AuthUser`] it belongs to.
pub async fn resolve_token(
    repo: &dyn Repository,
    config: &AppConfig,
    token: &str,
) -> Result<AuthUser, ApiError> {
    let user_id = decode_access_token(token, &config.secret_key)?;

    // Tokens of deleted accounts stay cryptographically valid; the lookup rejects them.
    let user = repo
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }

    Ok(AuthUser::from(user))
}

/// authenticate
///
/// Checks an email/password pair. Unknown email and wrong password are indistinguishable.
pub async fn authenticate(repo: &dyn Repository, email: &str, password: &str) -> Result<User, ApiError> {
    let user = repo
        .get_user_by_email(email)
        .await?
        .filter(|user| verify_password(password, &user.hashed_password))
        .ok_or_else(|| ApiError::bad_request("Incorrect email or password"))?;

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }
    Ok(user)
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    /// Admins bypass every ownership rule.
    pub is_admin: bool,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            is_admin: user.is_admin,
        }
    }
}

impl AuthUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            is_active: self.is_active,
            is_admin: self.is_admin,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument:
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Token Extraction: header first, then cookie.
/// 3. Token Validation and DB Lookup through [`resolve_token`].
///
/// Rejection: 401 for missing or invalid credentials, 400 for deactivated accounts.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth_middleware so the lookup is not repeated per extractor.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = extract_token(&parts.headers)?
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let user = resolve_token(repo.as_ref(), &config, &token).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
