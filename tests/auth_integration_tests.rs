mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use chrono::Utc;
use common::{insert_user, insert_user_with_password, test_state, token_for};
use jsonwebtoken::{EncodingKey, Header, encode};
use learning_platform::{
    AppState,
    auth::{
        AuthUser, Claims, authenticate, create_access_token, decode_access_token, hash_password,
        verify_password,
    },
    models::UserChanges,
};

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
}

fn with_cookie(parts: &mut Parts, value: &str) {
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("access_token={}", value)).unwrap(),
    );
}

fn sign(state: &AppState, sub: &str, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        exp: (now + exp_offset_secs) as usize,
        iat: now as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.secret_key.as_bytes()),
    )
    .unwrap()
}

async fn extract(state: &AppState, parts: &mut Parts) -> Result<AuthUser, StatusCode> {
    AuthUser::from_request_parts(parts, state)
        .await
        .map_err(|e| e.status())
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_bearer_header() {
    let state = test_state();
    let user = insert_user(&state, "alice@example.com", false).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token_for(&state, &user));

    let auth_user = extract(&state, &mut parts).await.unwrap();
    assert_eq!(auth_user.id, user.id);
    assert_eq!(auth_user.email, "alice@example.com");
    assert!(!auth_user.is_admin);
}

#[tokio::test]
async fn test_auth_failure_with_missing_credentials() {
    let state = test_state();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    assert_eq!(extract(&state, &mut parts).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_success_with_cookie_with_and_without_bearer_prefix() {
    let state = test_state();
    let user = insert_user(&state, "cookie@example.com", false).await;
    let token = token_for(&state, &user);

    let mut plain = get_request_parts(Method::GET, "/".parse().unwrap());
    with_cookie(&mut plain, &token);
    assert_eq!(extract(&state, &mut plain).await.unwrap().id, user.id);

    // The admin login stores the token as "Bearer <token>".
    let mut prefixed = get_request_parts(Method::GET, "/".parse().unwrap());
    with_cookie(&mut prefixed, &format!("Bearer {}", token));
    assert_eq!(extract(&state, &mut prefixed).await.unwrap().id, user.id);
}

#[tokio::test]
async fn test_header_takes_precedence_over_cookie() {
    let state = test_state();
    let header_user = insert_user(&state, "header@example.com", false).await;
    let cookie_user = insert_user(&state, "cookie@example.com", false).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token_for(&state, &header_user));
    with_cookie(&mut parts, &token_for(&state, &cookie_user));
    assert_eq!(extract(&state, &mut parts).await.unwrap().id, header_user.id);

    // A bad header is not rescued by a good cookie.
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, "garbage");
    with_cookie(&mut parts, &token_for(&state, &cookie_user));
    assert_eq!(extract(&state, &mut parts).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let state = test_state();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Basic dXNlcjpwYXNz"),
    );

    assert_eq!(extract(&state, &mut parts).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let state = test_state();
    let user = insert_user(&state, "late@example.com", false).await;

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &sign(&state, &user.id.to_string(), -7200));

    assert_eq!(extract(&state, &mut parts).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let state = test_state();
    let user = insert_user(&state, "victim@example.com", false).await;
    let forged = create_access_token(user.id, "some-other-secret", 30).unwrap();

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &forged);

    assert_eq!(extract(&state, &mut parts).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_non_numeric_subject() {
    let state = test_state();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &sign(&state, "admin@example.com", 600));

    assert_eq!(extract(&state, &mut parts).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_unknown_user() {
    let state = test_state();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &sign(&state, "4242", 600));

    let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Could not validate credentials");
}

#[tokio::test]
async fn test_inactive_user_is_bad_request() {
    let state = test_state();
    let user = insert_user(&state, "sleepy@example.com", false).await;
    state
        .repo
        .update_user(
            user.id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token_for(&state, &user));

    let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Inactive user");
}

#[test]
fn test_token_round_trip_carries_user_id() {
    let token = create_access_token(17, "secret", 5).unwrap();
    assert_eq!(decode_access_token(&token, "secret").unwrap(), 17);
    assert!(decode_access_token(&token, "other").is_err());
}

#[test]
fn test_password_hash_and_verify() {
    let hash = hash_password("hunter2").unwrap();
    assert_ne!(hash, "hunter2");
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
    assert!(!verify_password("hunter2", "not-a-phc-string"));
}

#[tokio::test]
async fn test_authenticate_rejects_wrong_password() {
    let state = test_state();
    insert_user_with_password(&state, "Bob", "bob@example.com", "right-password", false).await;

    let ok = authenticate(state.repo.as_ref(), "bob@example.com", "right-password").await;
    assert_eq!(ok.unwrap().email, "bob@example.com");

    let err = authenticate(state.repo.as_ref(), "bob@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Incorrect email or password");

    let err = authenticate(state.repo.as_ref(), "nobody@example.com", "x").await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}
