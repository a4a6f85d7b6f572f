use super::{RepoResult, Repository};
use crate::error::RepositoryError;
use crate::models::{
    ActiveUser, Comment, Course, CreateCourseRequest, CreateLessonRequest, DashboardCounts, Enrollment,
    Lesson, NewUser, Pagination, PlatformStats, PopularCourse, PopularLesson, Rating, UpdateCourseRequest,
    UpdateLessonRequest, User, UserChanges,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// One table: rows keyed by id plus the last id handed out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn page<F>(&self, page: Pagination, filter: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        page.apply(self.rows.values().filter(|row| filter(row)).cloned())
    }

    fn all<F>(&self, filter: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.rows.values().filter(|row| filter(row)).cloned().collect()
    }

    fn latest(&self, limit: i64) -> Vec<T> {
        self.rows.values().rev().take(limit.max(0) as usize).cloned().collect()
    }

    fn count(&self) -> i64 {
        self.rows.len() as i64
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    courses: Table<Course>,
    lessons: Table<Lesson>,
    comments: Table<Comment>,
    ratings: Table<Rating>,
    enrollments: Table<Enrollment>,
}

impl Tables {
    fn remove_lesson(&mut self, lesson_id: i64) -> Option<Lesson> {
        let lesson = self.lessons.rows.remove(&lesson_id)?;
        self.comments.rows.retain(|_, c| c.lesson_id != lesson_id);
        self.ratings.rows.retain(|_, r| r.lesson_id != lesson_id);
        Some(lesson)
    }

    fn remove_course(&mut self, course_id: i64) -> Option<Course> {
        let course = self.courses.rows.remove(&course_id)?;
        let lesson_ids: Vec<i64> = self
            .lessons
            .rows
            .values()
            .filter(|l| l.course_id == course_id)
            .map(|l| l.id)
            .collect();
        for id in lesson_ids {
            self.remove_lesson(id);
        }
        self.enrollments.rows.retain(|_, e| e.course_id != course_id);
        Some(course)
    }

    fn remove_user(&mut self, user_id: i64) -> Option<User> {
        let user = self.users.rows.remove(&user_id)?;
        let course_ids: Vec<i64> = self
            .courses
            .rows
            .values()
            .filter(|c| c.author_id == user_id)
            .map(|c| c.id)
            .collect();
        for id in course_ids {
            self.remove_course(id);
        }
        self.comments.rows.retain(|_, c| c.user_id != user_id);
        self.ratings.rows.retain(|_, r| r.user_id != user_id);
        self.enrollments.rows.retain(|_, e| e.user_id != user_id);
        Some(user)
    }

    /// Mirrors the `UNIQUE` constraint on `users.email`.
    fn ensure_email_free(&self, email: &str, owner: Option<i64>) -> RepoResult<()> {
        let taken = self
            .users
            .rows
            .values()
            .any(|u| u.email == email && Some(u.id) != owner);
        if taken {
            return Err(RepositoryError::Duplicate("users_email_key".to_string()));
        }
        Ok(())
    }

    fn find_enrollment(&self, user_id: i64, course_id: i64) -> Option<Enrollment> {
        self.enrollments
            .rows
            .values()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned()
    }

    fn average(&self, mut filter: impl FnMut(&Rating) -> bool) -> f64 {
        let (sum, n) = self
            .ratings
            .rows
            .values()
            .filter(|r| filter(r))
            .fold((0i64, 0i64), |(sum, n), r| (sum + r.stars as i64, n + 1));
        if n == 0 { 0.0 } else { sum as f64 / n as f64 }
    }
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. Backs local runs without a
/// `DATABASE_URL` and the integration tests. A single `RwLock` guards all tables and is
/// held for the duration of one operation, which makes every call atomic. Deletes
/// cascade the same way the Postgres foreign keys do.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- Users ---

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.tables.read().users.get(id))
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.tables.read().users.rows.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_full_name(&self, full_name: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .rows
            .values()
            .find(|u| u.full_name == full_name)
            .cloned())
    }

    async fn list_users(&self, page: Pagination) -> RepoResult<Vec<User>> {
        Ok(self.tables.read().users.page(page, |_| true))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write();
        tables.ensure_email_free(&user.email, None)?;
        let id = tables.users.next_id();
        let user = User {
            id,
            full_name: user.full_name,
            email: user.email,
            hashed_password: user.hashed_password,
            is_active: user.is_active,
            is_admin: user.is_admin,
        };
        tables.users.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write();
        if !tables.users.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(email) = &changes.email {
            tables.ensure_email_free(email, Some(id))?;
        }
        let Some(user) = tables.users.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hashed_password) = changes.hashed_password {
            user.hashed_password = hashed_password;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        if let Some(is_admin) = changes.is_admin {
            user.is_admin = is_admin;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.tables.write().remove_user(id))
    }

    // --- Courses ---

    async fn get_course(&self, id: i64) -> RepoResult<Option<Course>> {
        Ok(self.tables.read().courses.get(id))
    }

    async fn list_courses(&self, title: Option<&str>, page: Pagination) -> RepoResult<Vec<Course>> {
        let needle = title.map(str::to_lowercase);
        Ok(self.tables.read().courses.page(page, |c| match &needle {
            Some(n) => c.title.to_lowercase().contains(n.as_str()),
            None => true,
        }))
    }

    async fn list_courses_by_author(&self, author_id: i64, page: Pagination) -> RepoResult<Vec<Course>> {
        Ok(self.tables.read().courses.page(page, |c| c.author_id == author_id))
    }

    async fn create_course(&self, author_id: i64, req: CreateCourseRequest) -> RepoResult<Course> {
        let mut tables = self.tables.write();
        let id = tables.courses.next_id();
        let course = Course {
            id,
            title: req.title,
            description: req.description,
            author_id,
        };
        tables.courses.rows.insert(id, course.clone());
        Ok(course)
    }

    async fn update_course(&self, id: i64, req: UpdateCourseRequest) -> RepoResult<Option<Course>> {
        let mut tables = self.tables.write();
        let Some(course) = tables.courses.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            course.title = title;
        }
        if req.description.is_some() {
            course.description = req.description;
        }
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: i64) -> RepoResult<Option<Course>> {
        Ok(self.tables.write().remove_course(id))
    }

    // --- Lessons ---

    async fn get_lesson(&self, id: i64) -> RepoResult<Option<Lesson>> {
        Ok(self.tables.read().lessons.get(id))
    }

    async fn list_lessons(&self, page: Pagination) -> RepoResult<Vec<Lesson>> {
        Ok(self.tables.read().lessons.page(page, |_| true))
    }

    async fn list_lessons_by_course(&self, course_id: i64) -> RepoResult<Vec<Lesson>> {
        Ok(self.tables.read().lessons.all(|l| l.course_id == course_id))
    }

    async fn create_lesson(&self, req: CreateLessonRequest) -> RepoResult<Lesson> {
        let mut tables = self.tables.write();
        let id = tables.lessons.next_id();
        let lesson = Lesson {
            id,
            course_id: req.course_id,
            title: req.title,
            video_url: req.video_url,
            content: req.content,
        };
        tables.lessons.rows.insert(id, lesson.clone());
        Ok(lesson)
    }

    async fn update_lesson(&self, id: i64, req: UpdateLessonRequest) -> RepoResult<Option<Lesson>> {
        let mut tables = self.tables.write();
        let Some(lesson) = tables.lessons.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            lesson.title = title;
        }
        if req.video_url.is_some() {
            lesson.video_url = req.video_url;
        }
        if req.content.is_some() {
            lesson.content = req.content;
        }
        Ok(Some(lesson.clone()))
    }

    async fn delete_lesson(&self, id: i64) -> RepoResult<Option<Lesson>> {
        Ok(self.tables.write().remove_lesson(id))
    }

    // --- Comments ---

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        Ok(self.tables.read().comments.get(id))
    }

    async fn list_comments(&self, page: Pagination) -> RepoResult<Vec<Comment>> {
        Ok(self.tables.read().comments.page(page, |_| true))
    }

    async fn list_comments_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Comment>> {
        Ok(self.tables.read().comments.page(page, |c| c.user_id == user_id))
    }

    async fn list_comments_by_lesson(&self, lesson_id: i64, page: Pagination) -> RepoResult<Vec<Comment>> {
        Ok(self.tables.read().comments.page(page, |c| c.lesson_id == lesson_id))
    }

    async fn list_comments_of_lesson(&self, lesson_id: i64) -> RepoResult<Vec<Comment>> {
        Ok(self.tables.read().comments.all(|c| c.lesson_id == lesson_id))
    }

    async fn create_comment(&self, user_id: i64, lesson_id: i64, text: String) -> RepoResult<Comment> {
        let mut tables = self.tables.write();
        let id = tables.comments.next_id();
        let comment = Comment {
            id,
            user_id,
            lesson_id,
            text,
            created_at: Utc::now(),
        };
        tables.comments.rows.insert(id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, text: Option<String>) -> RepoResult<Option<Comment>> {
        let mut tables = self.tables.write();
        let Some(comment) = tables.comments.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(text) = text {
            comment.text = text;
        }
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        Ok(self.tables.write().comments.rows.remove(&id))
    }

    // --- Ratings ---

    async fn get_rating(&self, id: i64) -> RepoResult<Option<Rating>> {
        Ok(self.tables.read().ratings.get(id))
    }

    async fn list_ratings(&self, page: Pagination) -> RepoResult<Vec<Rating>> {
        Ok(self.tables.read().ratings.page(page, |_| true))
    }

    async fn list_ratings_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Rating>> {
        Ok(self.tables.read().ratings.page(page, |r| r.user_id == user_id))
    }

    async fn list_ratings_by_lesson(&self, lesson_id: i64, page: Pagination) -> RepoResult<Vec<Rating>> {
        Ok(self.tables.read().ratings.page(page, |r| r.lesson_id == lesson_id))
    }

    async fn list_ratings_of_lesson(&self, lesson_id: i64) -> RepoResult<Vec<Rating>> {
        Ok(self.tables.read().ratings.all(|r| r.lesson_id == lesson_id))
    }

    async fn upsert_rating(&self, user_id: i64, lesson_id: i64, stars: i32) -> RepoResult<Rating> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables
            .ratings
            .rows
            .values_mut()
            .find(|r| r.user_id == user_id && r.lesson_id == lesson_id)
        {
            existing.stars = stars;
            return Ok(existing.clone());
        }

        let id = tables.ratings.next_id();
        let rating = Rating {
            id,
            user_id,
            lesson_id,
            stars,
        };
        tables.ratings.rows.insert(id, rating.clone());
        Ok(rating)
    }

    async fn update_rating(&self, id: i64, stars: Option<i32>) -> RepoResult<Option<Rating>> {
        let mut tables = self.tables.write();
        let Some(rating) = tables.ratings.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(stars) = stars {
            rating.stars = stars;
        }
        Ok(Some(rating.clone()))
    }

    async fn delete_rating(&self, id: i64) -> RepoResult<Option<Rating>> {
        Ok(self.tables.write().ratings.rows.remove(&id))
    }

    async fn average_rating(&self, lesson_id: i64) -> RepoResult<f64> {
        Ok(self.tables.read().average(|r| r.lesson_id == lesson_id))
    }

    // --- Enrollments ---

    async fn get_enrollment(&self, id: i64) -> RepoResult<Option<Enrollment>> {
        Ok(self.tables.read().enrollments.get(id))
    }

    async fn find_enrollment(&self, user_id: i64, course_id: i64) -> RepoResult<Option<Enrollment>> {
        Ok(self.tables.read().find_enrollment(user_id, course_id))
    }

    async fn list_enrollments(&self, page: Pagination) -> RepoResult<Vec<Enrollment>> {
        Ok(self.tables.read().enrollments.page(page, |_| true))
    }

    async fn list_enrollments_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Enrollment>> {
        Ok(self.tables.read().enrollments.page(page, |e| e.user_id == user_id))
    }

    async fn enroll(&self, user_id: i64, course_id: i64) -> RepoResult<Enrollment> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.find_enrollment(user_id, course_id) {
            return Ok(existing);
        }

        let id = tables.enrollments.next_id();
        let enrollment = Enrollment {
            id,
            user_id,
            course_id,
            enrolled_at: Utc::now(),
        };
        tables.enrollments.rows.insert(id, enrollment.clone());
        Ok(enrollment)
    }

    async fn update_enrollment(&self, id: i64, course_id: Option<i64>) -> RepoResult<Option<Enrollment>> {
        let mut tables = self.tables.write();
        let Some(enrollment) = tables.enrollments.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(course_id) = course_id {
            enrollment.course_id = course_id;
        }
        Ok(Some(enrollment.clone()))
    }

    async fn delete_enrollment(&self, id: i64) -> RepoResult<Option<Enrollment>> {
        Ok(self.tables.write().enrollments.rows.remove(&id))
    }

    async fn list_enrolled_users(&self, course_id: i64, page: Pagination) -> RepoResult<Vec<User>> {
        let tables = self.tables.read();
        let enrolled: Vec<i64> = tables
            .enrollments
            .rows
            .values()
            .filter(|e| e.course_id == course_id)
            .map(|e| e.user_id)
            .collect();
        Ok(tables.users.page(page, |u| enrolled.contains(&u.id)))
    }

    // --- Statistics ---

    async fn platform_stats(&self) -> RepoResult<PlatformStats> {
        let tables = self.tables.read();
        Ok(PlatformStats {
            total_users: tables.users.count(),
            total_courses: tables.courses.count(),
            total_lessons: tables.lessons.count(),
            total_comments: tables.comments.count(),
            total_ratings: tables.ratings.count(),
            average_rating: tables.average(|_| true),
        })
    }

    async fn dashboard_counts(&self) -> RepoResult<DashboardCounts> {
        let tables = self.tables.read();
        Ok(DashboardCounts {
            users_count: tables.users.count(),
            courses_count: tables.courses.count(),
            lessons_count: tables.lessons.count(),
            enrollments_count: tables.enrollments.count(),
        })
    }

    async fn popular_courses(&self, limit: i64) -> RepoResult<Vec<PopularCourse>> {
        let tables = self.tables.read();
        let mut ranked: Vec<PopularCourse> = tables
            .courses
            .rows
            .values()
            .map(|c| PopularCourse {
                id: c.id,
                title: c.title.clone(),
                enrollment_count: tables.enrollments.rows.values().filter(|e| e.course_id == c.id).count()
                    as i64,
            })
            .collect();
        // Stable sort keeps id order among ties.
        ranked.sort_by(|a, b| b.enrollment_count.cmp(&a.enrollment_count));
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }

    async fn popular_lessons(&self, limit: i64) -> RepoResult<Vec<PopularLesson>> {
        let tables = self.tables.read();
        let mut ranked: Vec<PopularLesson> = tables
            .lessons
            .rows
            .values()
            .map(|l| PopularLesson {
                id: l.id,
                title: l.title.clone(),
                comment_count: tables.comments.rows.values().filter(|c| c.lesson_id == l.id).count() as i64,
                rating_count: tables.ratings.rows.values().filter(|r| r.lesson_id == l.id).count() as i64,
                avg_rating: tables.average(|r| r.lesson_id == l.id),
            })
            .collect();
        ranked.sort_by(|a, b| (b.comment_count + b.rating_count).cmp(&(a.comment_count + a.rating_count)));
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }

    async fn active_users(&self, limit: i64) -> RepoResult<Vec<ActiveUser>> {
        let tables = self.tables.read();
        let mut ranked: Vec<ActiveUser> = tables
            .users
            .rows
            .values()
            .map(|u| {
                let enrollment_count =
                    tables.enrollments.rows.values().filter(|e| e.user_id == u.id).count() as i64;
                let comment_count = tables.comments.rows.values().filter(|c| c.user_id == u.id).count() as i64;
                let rating_count = tables.ratings.rows.values().filter(|r| r.user_id == u.id).count() as i64;
                ActiveUser {
                    id: u.id,
                    full_name: u.full_name.clone(),
                    email: u.email.clone(),
                    enrollment_count,
                    comment_count,
                    rating_count,
                    activity_score: enrollment_count + comment_count + rating_count,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.activity_score.cmp(&a.activity_score));
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }

    async fn recent_courses(&self, limit: i64) -> RepoResult<Vec<Course>> {
        Ok(self.tables.read().courses.latest(limit))
    }

    async fn recent_users(&self, limit: i64) -> RepoResult<Vec<User>> {
        Ok(self.tables.read().users.latest(limit))
    }
}
