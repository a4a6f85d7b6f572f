use crate::{
    AppState,
    access,
    auth::{ACCESS_TOKEN_COOKIE, AuthUser, create_access_token, resolve_token, verify_password},
    config::API_V1_STR,
    error::{ApiError, ApiForm, ApiQuery},
    models::{
        AdminDashboard, AdminOverview, Comment, Course, CourseWithLessons, Enrollment, LessonWithDetails,
        LoginRequest, Pagination, Rating, User, UserProfile,
    },
    repository::Repository,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::BTreeMap;

/// Lifetime of the admin session cookie's token.
const ADMIN_SESSION_MINUTES: i64 = 30;
const RECENT_ITEMS: i64 = 5;

fn login_path() -> String {
    format!("{API_V1_STR}/admin/login")
}

fn dashboard_path() -> String {
    format!("{API_V1_STR}/admin/dashboard")
}

fn login_page(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|message| format!(r#"<p class="error">{message}</p>"#))
        .unwrap_or_default();
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Admin Login</title></head>
<body>
<h1>Admin Login</h1>
{error}
<form method="post" action="{action}">
<label>Username or email <input type="text" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
</body>
</html>"#,
        action = login_path(),
    ))
}

/// Looks the admin form's username up as a full name first, then as an email.
async fn find_login_user(repo: &dyn Repository, username: &str) -> Result<Option<User>, ApiError> {
    if let Some(user) = repo.get_user_by_full_name(username).await? {
        return Ok(Some(user));
    }
    Ok(repo.get_user_by_email(username).await?)
}

/// admin_index
///
/// [Admin Route] Index of the admin JSON listings.
#[utoipa::path(
    get,
    path = "/api/v1/admin",
    responses(
        (status = 200, description = "Admin endpoints", body = AdminOverview),
        (status = 403, description = "Admin only")
    )
)]
pub async fn admin_index(user: AuthUser) -> Result<Json<AdminOverview>, ApiError> {
    access::require_admin(&user)?;

    let endpoints = ["users", "courses", "lessons", "enrollments", "comments", "ratings"]
        .into_iter()
        .map(|name| (name.to_string(), format!("{API_V1_STR}/admin/{name}")))
        .collect::<BTreeMap<_, _>>();

    Ok(Json(AdminOverview {
        message: "Welcome to the admin panel".to_string(),
        endpoints,
    }))
}

/// admin_users
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(Pagination),
    responses((status = 200, description = "All users", body = [UserProfile]))
)]
pub async fn admin_users(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    access::require_admin(&user)?;
    let users = state.repo.list_users(page).await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// admin_courses
///
/// [Admin Route] Every course with its lessons.
#[utoipa::path(
    get,
    path = "/api/v1/admin/courses",
    params(Pagination),
    responses((status = 200, description = "All courses", body = [CourseWithLessons]))
)]
pub async fn admin_courses(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<CourseWithLessons>>, ApiError> {
    access::require_admin(&user)?;

    let courses = state.repo.list_courses(None, page).await?;
    let mut detailed = Vec::with_capacity(courses.len());
    for course in courses {
        let lessons = state.repo.list_lessons_by_course(course.id).await?;
        detailed.push(CourseWithLessons { course, lessons });
    }
    Ok(Json(detailed))
}

/// admin_lessons
///
/// [Admin Route] Every lesson with its comments, ratings and average.
#[utoipa::path(
    get,
    path = "/api/v1/admin/lessons",
    params(Pagination),
    responses((status = 200, description = "All lessons", body = [LessonWithDetails]))
)]
pub async fn admin_lessons(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<LessonWithDetails>>, ApiError> {
    access::require_admin(&user)?;

    let lessons = state.repo.list_lessons(page).await?;
    let mut detailed = Vec::with_capacity(lessons.len());
    for lesson in lessons {
        let comments = state.repo.list_comments_of_lesson(lesson.id).await?;
        let ratings = state.repo.list_ratings_of_lesson(lesson.id).await?;
        let average_rating = state.repo.average_rating(lesson.id).await?;
        detailed.push(LessonWithDetails {
            lesson,
            comments,
            ratings,
            average_rating,
        });
    }
    Ok(Json(detailed))
}

/// admin_enrollments
#[utoipa::path(
    get,
    path = "/api/v1/admin/enrollments",
    params(Pagination),
    responses((status = 200, description = "All enrollments", body = [Enrollment]))
)]
pub async fn admin_enrollments(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    access::require_admin(&user)?;
    Ok(Json(state.repo.list_enrollments(page).await?))
}

/// admin_comments
#[utoipa::path(
    get,
    path = "/api/v1/admin/comments",
    params(Pagination),
    responses((status = 200, description = "All comments", body = [Comment]))
)]
pub async fn admin_comments(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    access::require_admin(&user)?;
    Ok(Json(state.repo.list_comments(page).await?))
}

/// admin_ratings
#[utoipa::path(
    get,
    path = "/api/v1/admin/ratings",
    params(Pagination),
    responses((status = 200, description = "All ratings", body = [Rating]))
)]
pub async fn admin_ratings(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Rating>>, ApiError> {
    access::require_admin(&user)?;
    Ok(Json(state.repo.list_ratings(page).await?))
}

/// admin_login_form
///
/// [Public Route] Minimal HTML login form for the cookie session.
#[utoipa::path(
    get,
    path = "/api/v1/admin/login",
    responses((status = 200, description = "Login form", body = String, content_type = "text/html"))
)]
pub async fn admin_login_form() -> Html<String> {
    login_page(None)
}

/// admin_login
///
/// [Public Route] Form login for administrators. On success sets the `access_token`
/// cookie and redirects to the dashboard; failures re-render the form with an error.
#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirect to dashboard"),
        (status = 400, description = "Invalid credentials", body = String, content_type = "text/html"),
        (status = 403, description = "Not an administrator", body = String, content_type = "text/html")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiForm(form): ApiForm<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = find_login_user(state.repo.as_ref(), &form.username)
        .await?
        .filter(|user| user.is_active && verify_password(&form.password, &user.hashed_password));

    let Some(user) = user else {
        tracing::info!(username = %form.username, "admin login rejected");
        return Ok((
            StatusCode::BAD_REQUEST,
            login_page(Some("Invalid username or password")),
        )
            .into_response());
    };

    if !user.is_admin {
        tracing::info!(user_id = user.id, "non-admin attempted admin login");
        return Ok((
            StatusCode::FORBIDDEN,
            login_page(Some("You don't have admin privileges")),
        )
            .into_response());
    }

    let token = create_access_token(user.id, &state.config.secret_key, ADMIN_SESSION_MINUTES)?;
    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, format!("Bearer {token}")))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    tracing::info!(user_id = user.id, "admin logged in");
    Ok((jar.add(cookie), Redirect::to(&dashboard_path())).into_response())
}

/// admin_logout
///
/// [Public Route] Drops the session cookie and returns to the login form.
#[utoipa::path(
    get,
    path = "/api/v1/admin/logout",
    responses((status = 303, description = "Redirect to login"))
)]
pub async fn admin_logout(jar: CookieJar) -> impl IntoResponse {
    // Sent even when the request carried no cookie.
    let mut expired = Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").http_only(true).build();
    expired.make_removal();
    (jar.add(expired), Redirect::to(&login_path()))
}

/// admin_dashboard
///
/// [Cookie Route] Platform counts plus the most recent courses and users. Requests without
/// a valid session cookie are sent back to the login form.
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard", body = AdminDashboard),
        (status = 303, description = "No valid session, redirect to login"),
        (status = 403, description = "Not an administrator", body = String, content_type = "text/html")
    )
)]
pub async fn admin_dashboard(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    let Some(raw) = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(Redirect::to(&login_path()).into_response());
    };
    let token = raw.strip_prefix("Bearer ").unwrap_or(&raw).trim();

    let user = match resolve_token(state.repo.as_ref(), &state.config, token).await {
        Ok(user) => user,
        Err(ApiError::Unauthorized(_) | ApiError::BadRequest(_)) => {
            return Ok(Redirect::to(&login_path()).into_response());
        }
        Err(other) => return Err(other),
    };

    if !user.is_admin {
        return Ok((
            StatusCode::FORBIDDEN,
            login_page(Some("You don't have admin privileges")),
        )
            .into_response());
    }

    let stats = state.repo.dashboard_counts().await?;
    let recent_courses: Vec<Course> = state.repo.recent_courses(RECENT_ITEMS).await?;
    let recent_users = state
        .repo
        .recent_users(RECENT_ITEMS)
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    Ok(Json(AdminDashboard {
        user: user.profile(),
        stats,
        recent_courses,
        recent_users,
    })
    .into_response())
}
