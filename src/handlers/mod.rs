//! HTTP handlers, one module per resource.
//!
//! Every handler receives the resolved [`AuthUser`] (where required) and the shared
//! [`AppState`](crate::AppState), loads the rows it needs, asks [`crate::access`] for a
//! decision and only then touches the repository for writes.

pub mod admin;
pub mod comments;
pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod login;
pub mod ratings;
pub mod stats;
pub mod users;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Course, Lesson},
    repository::Repository,
};

pub(crate) async fn find_course(repo: &dyn Repository, id: i64) -> Result<Course, ApiError> {
    repo.get_course(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))
}

pub(crate) async fn find_lesson(repo: &dyn Repository, id: i64) -> Result<Lesson, ApiError> {
    repo.get_lesson(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lesson not found"))
}

/// LessonScope
///
/// A lesson together with its parent course and whether the caller is enrolled in it.
/// Everything the lesson-level access rules need.
pub(crate) struct LessonScope {
    pub lesson: Lesson,
    pub course: Course,
    pub enrolled: bool,
}

impl LessonScope {
    pub async fn load(repo: &dyn Repository, user: &AuthUser, lesson_id: i64) -> Result<Self, ApiError> {
        let lesson = find_lesson(repo, lesson_id).await?;
        let course = find_course(repo, lesson.course_id).await?;
        let enrolled = repo.find_enrollment(user.id, course.id).await?.is_some();
        Ok(Self {
            lesson,
            course,
            enrolled,
        })
    }

    pub fn resource(&self) -> crate::access::Resource<'_> {
        crate::access::Resource::CourseContent {
            course: &self.course,
            enrolled: self.enrolled,
        }
    }
}
