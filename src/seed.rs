use crate::{
    auth::hash_password,
    config::{AppConfig, Env},
    error::ApiError,
    models::{CreateCourseRequest, CreateLessonRequest, NewUser, Pagination, User},
    repository::Repository,
};

const SAMPLE_USER_EMAIL: &str = "test@example.com";
const SAMPLE_USER_PASSWORD: &str = "testpassword";
const SAMPLE_COURSE_TITLE: &str = "Introduction to Python";

/// init_db
///
/// Bootstraps the store after migrations. Creates the configured administrator when it
/// does not exist yet and, in local mode, a sample user with one course, two lessons,
/// an enrollment and a comment. Safe to run on every startup.
pub async fn init_db(repo: &dyn Repository, config: &AppConfig) -> Result<(), ApiError> {
    if let (Some(email), Some(password)) = (&config.first_admin_email, &config.first_admin_password) {
        ensure_user(repo, "Admin", email, password, true).await?;
    }

    if config.env == Env::Local {
        let user = ensure_user(repo, "Test User", SAMPLE_USER_EMAIL, SAMPLE_USER_PASSWORD, false).await?;
        seed_sample_course(repo, &user).await?;
    }

    Ok(())
}

async fn ensure_user(
    repo: &dyn Repository,
    full_name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> Result<User, ApiError> {
    if let Some(existing) = repo.get_user_by_email(email).await? {
        return Ok(existing);
    }

    let user = repo
        .create_user(NewUser {
            full_name: full_name.to_string(),
            email: email.to_string(),
            hashed_password: hash_password(password)?,
            is_active: true,
            is_admin,
        })
        .await?;
    tracing::info!(user_id = user.id, email = %user.email, is_admin, "seeded user");
    Ok(user)
}

async fn seed_sample_course(repo: &dyn Repository, author: &User) -> Result<(), ApiError> {
    let existing = repo
        .list_courses_by_author(author.id, Pagination::default())
        .await?
        .into_iter()
        .find(|c| c.title == SAMPLE_COURSE_TITLE);
    if existing.is_some() {
        return Ok(());
    }

    let course = repo
        .create_course(
            author.id,
            CreateCourseRequest {
                title: SAMPLE_COURSE_TITLE.to_string(),
                description: Some("Learn the basics of Python programming".to_string()),
            },
        )
        .await?;

    let lessons = [
        ("Variables and Data Types", "https://example.com/video1", "Learn about variables and data types in Python"),
        ("Control Flow", "https://example.com/video2", "Learn about if statements, loops, and more"),
    ];
    let mut first_lesson = None;
    for (title, video_url, content) in lessons {
        let lesson = repo
            .create_lesson(CreateLessonRequest {
                course_id: course.id,
                title: title.to_string(),
                video_url: Some(video_url.to_string()),
                content: Some(content.to_string()),
            })
            .await?;
        first_lesson.get_or_insert(lesson.id);
    }

    repo.enroll(author.id, course.id).await?;
    if let Some(lesson_id) = first_lesson {
        repo.create_comment(author.id, lesson_id, "Great lesson! Very informative.".to_string())
            .await?;
    }

    tracing::info!(course_id = course.id, "seeded sample course");
    Ok(())
}
