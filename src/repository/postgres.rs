use super::{RepoResult, Repository};
use crate::{
    models::{
        ActiveUser, Comment, Course, CreateCourseRequest, CreateLessonRequest, DashboardCounts,
        Enrollment, Lesson, NewUser, Pagination, PlatformStats, PopularCourse, PopularLesson, Rating,
        UpdateCourseRequest, UpdateLessonRequest, User, UserChanges,
    },
};
use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Every statement auto-commits; cascades are delegated to the `ON DELETE CASCADE`
/// foreign keys created by the embedded migrations.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `./migrations`.
    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn count(&self, table: &str) -> RepoResult<i64> {
        // `table` only ever comes from the fixed names in this file.
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Users ---

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_full_name(&self, full_name: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE full_name = $1 ORDER BY id LIMIT 1",
        )
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self, page: Pagination) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id OFFSET $1 LIMIT $2")
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, hashed_password, is_active, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user.full_name)
        .bind(user.email)
        .bind(user.hashed_password)
        .bind(user.is_active)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// update_user
    ///
    /// Uses `COALESCE` so that `None` fields keep their stored value.
    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                hashed_password = COALESCE($4, hashed_password),
                is_active = COALESCE($5, is_active),
                is_admin = COALESCE($6, is_admin)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.email)
        .bind(changes.hashed_password)
        .bind(changes.is_active)
        .bind(changes.is_admin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // --- Courses ---

    async fn get_course(&self, id: i64) -> RepoResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    /// list_courses
    ///
    /// Builds the optional title filter with `QueryBuilder` so the pattern is always bound.
    async fn list_courses(&self, title: Option<&str>, page: Pagination) -> RepoResult<Vec<Course>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("SELECT * FROM courses");

        if let Some(t) = title {
            builder.push(" WHERE title ILIKE ");
            builder.push_bind(format!("%{}%", t));
        }

        builder.push(" ORDER BY id OFFSET ");
        builder.push_bind(page.offset());
        builder.push(" LIMIT ");
        builder.push_bind(page.limit());

        let courses = builder.build_query_as::<Course>().fetch_all(&self.pool).await?;
        Ok(courses)
    }

    async fn list_courses_by_author(&self, author_id: i64, page: Pagination) -> RepoResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE author_id = $1 ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(author_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn create_course(&self, author_id: i64, req: CreateCourseRequest) -> RepoResult<Course> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (title, description, author_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(req.title)
        .bind(req.description)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    async fn update_course(&self, id: i64, req: UpdateCourseRequest) -> RepoResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn delete_course(&self, id: i64) -> RepoResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>("DELETE FROM courses WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    // --- Lessons ---

    async fn get_lesson(&self, id: i64) -> RepoResult<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lesson)
    }

    async fn list_lessons(&self, page: Pagination) -> RepoResult<Vec<Lesson>> {
        let lessons = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons ORDER BY id OFFSET $1 LIMIT $2")
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;
        Ok(lessons)
    }

    async fn list_lessons_by_course(&self, course_id: i64) -> RepoResult<Vec<Lesson>> {
        let lessons = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE course_id = $1 ORDER BY id")
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(lessons)
    }

    async fn create_lesson(&self, req: CreateLessonRequest) -> RepoResult<Lesson> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            INSERT INTO lessons (course_id, title, video_url, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(req.course_id)
        .bind(req.title)
        .bind(req.video_url)
        .bind(req.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(lesson)
    }

    async fn update_lesson(&self, id: i64, req: UpdateLessonRequest) -> RepoResult<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            UPDATE lessons
            SET title = COALESCE($2, title),
                video_url = COALESCE($3, video_url),
                content = COALESCE($4, content)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.video_url)
        .bind(req.content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lesson)
    }

    async fn delete_lesson(&self, id: i64) -> RepoResult<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>("DELETE FROM lessons WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lesson)
    }

    // --- Comments ---

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn list_comments(&self, page: Pagination) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>("SELECT * FROM comments ORDER BY id OFFSET $1 LIMIT $2")
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn list_comments_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE user_id = $1 ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn list_comments_by_lesson(&self, lesson_id: i64, page: Pagination) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE lesson_id = $1 ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(lesson_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn list_comments_of_lesson(&self, lesson_id: i64) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE lesson_id = $1 ORDER BY id")
            .bind(lesson_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn create_comment(&self, user_id: i64, lesson_id: i64, text: String) -> RepoResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (user_id, lesson_id, text) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, text: Option<String>) -> RepoResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET text = COALESCE($2, text) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("DELETE FROM comments WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    // --- Ratings ---

    async fn get_rating(&self, id: i64) -> RepoResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>("SELECT * FROM ratings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rating)
    }

    async fn list_ratings(&self, page: Pagination) -> RepoResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>("SELECT * FROM ratings ORDER BY id OFFSET $1 LIMIT $2")
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;
        Ok(ratings)
    }

    async fn list_ratings_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE user_id = $1 ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn list_ratings_by_lesson(&self, lesson_id: i64, page: Pagination) -> RepoResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE lesson_id = $1 ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(lesson_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn list_ratings_of_lesson(&self, lesson_id: i64) -> RepoResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>("SELECT * FROM ratings WHERE lesson_id = $1 ORDER BY id")
            .bind(lesson_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ratings)
    }

    /// upsert_rating
    ///
    /// Updates the caller's existing rating for the lesson if there is one, inserts otherwise.
    async fn upsert_rating(&self, user_id: i64, lesson_id: i64, stars: i32) -> RepoResult<Rating> {
        let updated = sqlx::query_as::<_, Rating>(
            r#"
            UPDATE ratings SET stars = $3
            WHERE id = (
                SELECT id FROM ratings WHERE user_id = $1 AND lesson_id = $2 ORDER BY id LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(stars)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(rating) = updated {
            return Ok(rating);
        }

        let rating = sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (user_id, lesson_id, stars) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(stars)
        .fetch_one(&self.pool)
        .await?;
        Ok(rating)
    }

    async fn update_rating(&self, id: i64, stars: Option<i32>) -> RepoResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "UPDATE ratings SET stars = COALESCE($2, stars) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(stars)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating)
    }

    async fn delete_rating(&self, id: i64) -> RepoResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>("DELETE FROM ratings WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rating)
    }

    async fn average_rating(&self, lesson_id: i64) -> RepoResult<f64> {
        let avg: f64 = sqlx::query_scalar(
            "SELECT COALESCE(AVG(stars)::float8, 0.0) FROM ratings WHERE lesson_id = $1",
        )
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(avg)
    }

    // --- Enrollments ---

    async fn get_enrollment(&self, id: i64) -> RepoResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(enrollment)
    }

    async fn find_enrollment(&self, user_id: i64, course_id: i64) -> RepoResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2 ORDER BY id LIMIT 1",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn list_enrollments(&self, page: Pagination) -> RepoResult<Vec<Enrollment>> {
        let enrollments =
            sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments ORDER BY id OFFSET $1 LIMIT $2")
                .bind(page.offset())
                .bind(page.limit())
                .fetch_all(&self.pool)
                .await?;
        Ok(enrollments)
    }

    async fn list_enrollments_by_user(&self, user_id: i64, page: Pagination) -> RepoResult<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1 ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(enrollments)
    }

    async fn enroll(&self, user_id: i64, course_id: i64) -> RepoResult<Enrollment> {
        if let Some(existing) = self.find_enrollment(user_id, course_id).await? {
            return Ok(existing);
        }

        let enrollment = sqlx::query_as::<_, Enrollment>(
            "INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn update_enrollment(&self, id: i64, course_id: Option<i64>) -> RepoResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "UPDATE enrollments SET course_id = COALESCE($2, course_id) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn delete_enrollment(&self, id: i64) -> RepoResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>("DELETE FROM enrollments WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(enrollment)
    }

    async fn list_enrolled_users(&self, course_id: i64, page: Pagination) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            WHERE u.id IN (SELECT e.user_id FROM enrollments e WHERE e.course_id = $1)
            ORDER BY u.id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(course_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // --- Statistics ---

    async fn platform_stats(&self) -> RepoResult<PlatformStats> {
        let average_rating: f64 = sqlx::query_scalar("SELECT COALESCE(AVG(stars)::float8, 0.0) FROM ratings")
            .fetch_one(&self.pool)
            .await?;

        Ok(PlatformStats {
            total_users: self.count("users").await?,
            total_courses: self.count("courses").await?,
            total_lessons: self.count("lessons").await?,
            total_comments: self.count("comments").await?,
            total_ratings: self.count("ratings").await?,
            average_rating,
        })
    }

    async fn dashboard_counts(&self) -> RepoResult<DashboardCounts> {
        Ok(DashboardCounts {
            users_count: self.count("users").await?,
            courses_count: self.count("courses").await?,
            lessons_count: self.count("lessons").await?,
            enrollments_count: self.count("enrollments").await?,
        })
    }

    async fn popular_courses(&self, limit: i64) -> RepoResult<Vec<PopularCourse>> {
        let courses = sqlx::query_as::<_, PopularCourse>(
            r#"
            SELECT c.id, c.title, COUNT(e.id) AS enrollment_count
            FROM courses c
            LEFT JOIN enrollments e ON e.course_id = c.id
            GROUP BY c.id, c.title
            ORDER BY enrollment_count DESC, c.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    /// popular_lessons
    ///
    /// Ranks by `comment_count + rating_count`. Counts come from correlated subqueries so
    /// that joining both child tables does not multiply rows.
    async fn popular_lessons(&self, limit: i64) -> RepoResult<Vec<PopularLesson>> {
        let lessons = sqlx::query_as::<_, PopularLesson>(
            r#"
            SELECT * FROM (
                SELECT l.id, l.title,
                    (SELECT COUNT(*) FROM comments c WHERE c.lesson_id = l.id) AS comment_count,
                    (SELECT COUNT(*) FROM ratings r WHERE r.lesson_id = l.id) AS rating_count,
                    COALESCE((SELECT AVG(r.stars)::float8 FROM ratings r WHERE r.lesson_id = l.id), 0.0) AS avg_rating
                FROM lessons l
            ) ranked
            ORDER BY (comment_count + rating_count) DESC, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(lessons)
    }

    async fn active_users(&self, limit: i64) -> RepoResult<Vec<ActiveUser>> {
        let users = sqlx::query_as::<_, ActiveUser>(
            r#"
            SELECT *, (enrollment_count + comment_count + rating_count) AS activity_score FROM (
                SELECT u.id, u.full_name, u.email,
                    (SELECT COUNT(*) FROM enrollments e WHERE e.user_id = u.id) AS enrollment_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.user_id = u.id) AS comment_count,
                    (SELECT COUNT(*) FROM ratings r WHERE r.user_id = u.id) AS rating_count
                FROM users u
            ) activity
            ORDER BY activity_score DESC, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn recent_courses(&self, limit: i64) -> RepoResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY id DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(courses)
    }

    async fn recent_users(&self, limit: i64) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}
