#![allow(dead_code)]

use learning_platform::{
    AppConfig, AppState, InMemoryRepository,
    auth::{AuthUser, create_access_token},
    models::{Course, CreateCourseRequest, CreateLessonRequest, Lesson, NewUser, User},
    repository::RepositoryState,
};
use std::sync::Arc;

/// Fresh state backed by an empty in-memory store and the default test config.
pub fn test_state() -> AppState {
    AppState {
        repo: Arc::new(InMemoryRepository::new()) as RepositoryState,
        config: AppConfig::default(),
    }
}

/// Inserts a user without hashing a password. Use [`insert_user_with_password`] when
/// the test needs to log in.
pub async fn insert_user(state: &AppState, email: &str, is_admin: bool) -> User {
    state
        .repo
        .create_user(NewUser {
            full_name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            hashed_password: "not-a-real-hash".to_string(),
            is_active: true,
            is_admin,
        })
        .await
        .unwrap()
}

pub async fn insert_user_with_password(state: &AppState, full_name: &str, email: &str, password: &str, is_admin: bool) -> User {
    state
        .repo
        .create_user(NewUser {
            full_name: full_name.to_string(),
            email: email.to_string(),
            hashed_password: learning_platform::auth::hash_password(password).unwrap(),
            is_active: true,
            is_admin,
        })
        .await
        .unwrap()
}

pub async fn insert_course(state: &AppState, author: &User, title: &str) -> Course {
    state
        .repo
        .create_course(
            author.id,
            CreateCourseRequest {
                title: title.to_string(),
                description: Some(format!("{title} description")),
            },
        )
        .await
        .unwrap()
}

pub async fn insert_lesson(state: &AppState, course: &Course, title: &str) -> Lesson {
    state
        .repo
        .create_lesson(CreateLessonRequest {
            course_id: course.id,
            title: title.to_string(),
            video_url: None,
            content: Some("content".to_string()),
        })
        .await
        .unwrap()
}

pub fn auth(user: &User) -> AuthUser {
    AuthUser::from(user.clone())
}

pub fn token_for(state: &AppState, user: &User) -> String {
    create_access_token(user.id, &state.config.secret_key, 30).unwrap()
}

/// A course with one lesson, its author, an enrolled student and an outsider.
pub struct Classroom {
    pub author: User,
    pub student: User,
    pub outsider: User,
    pub admin: User,
    pub course: Course,
    pub lesson: Lesson,
}

pub async fn classroom(state: &AppState) -> Classroom {
    let author = insert_user(state, "author@example.com", false).await;
    let student = insert_user(state, "student@example.com", false).await;
    let outsider = insert_user(state, "outsider@example.com", false).await;
    let admin = insert_user(state, "root@example.com", true).await;
    let course = insert_course(state, &author, "Rust for Beginners").await;
    let lesson = insert_lesson(state, &course, "Ownership").await;
    state.repo.enroll(student.id, course.id).await.unwrap();

    Classroom {
        author,
        student,
        outsider,
        admin,
        course,
        lesson,
    }
}
