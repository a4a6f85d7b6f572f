use chrono::Utc;
use axum::http::StatusCode;
use learning_platform::{
    ApiError, AppConfig, InMemoryRepository, PostgresRepository,
    config::Env,
    error::RepositoryError,
    models::{CreateCourseRequest, CreateLessonRequest, NewUser, Pagination, UpdateCourseRequest, User, UserChanges},
    repository::Repository,
    seed,
};
use sqlx::postgres::PgPoolOptions;

// --- Test Data Helpers ---

async fn create_test_user(repo: &dyn Repository, email: &str) -> User {
    repo.create_user(NewUser {
        full_name: email.split('@').next().unwrap_or(email).to_string(),
        email: email.to_string(),
        hashed_password: "hash".to_string(),
        is_active: true,
        is_admin: false,
    })
    .await
    .unwrap()
}

fn course(title: &str) -> CreateCourseRequest {
    CreateCourseRequest {
        title: title.to_string(),
        description: None,
    }
}

fn lesson(course_id: i64, title: &str) -> CreateLessonRequest {
    CreateLessonRequest {
        course_id,
        title: title.to_string(),
        video_url: None,
        content: None,
    }
}

// --- In-memory store ---

#[tokio::test]
async fn test_memory_ids_are_sequential_and_never_reused() {
    let repo = InMemoryRepository::new();
    let a = create_test_user(&repo, "a@example.com").await;
    let b = create_test_user(&repo, "b@example.com").await;
    assert_eq!((a.id, b.id), (1, 2));

    repo.delete_user(b.id).await.unwrap();
    let c = create_test_user(&repo, "c@example.com").await;
    assert_eq!(c.id, 3);
}

#[tokio::test]
async fn test_memory_user_update_is_partial() {
    let repo = InMemoryRepository::new();
    let user = create_test_user(&repo, "a@example.com").await;

    let updated = repo
        .update_user(
            user.id,
            UserChanges {
                full_name: Some("Alice".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.full_name, "Alice");
    assert_eq!(updated.email, "a@example.com");
    assert!(repo.update_user(99, UserChanges::default()).await.unwrap().is_none());
    assert_eq!(repo.get_user_by_full_name("Alice").await.unwrap().map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn test_memory_duplicate_email_is_rejected_as_bad_request() {
    let repo = InMemoryRepository::new();
    let first = create_test_user(&repo, "dup@example.com").await;
    let other = create_test_user(&repo, "other@example.com").await;

    let err = repo
        .create_user(NewUser {
            full_name: "Second".to_string(),
            email: "dup@example.com".to_string(),
            hashed_password: "hash".to_string(),
            is_active: true,
            is_admin: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));
    assert_eq!(ApiError::from(err).status(), StatusCode::BAD_REQUEST);

    let err = repo
        .update_user(
            other.id,
            UserChanges {
                email: Some("dup@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));

    // Keeping one's own email is not a conflict.
    let unchanged = repo
        .update_user(
            first.id,
            UserChanges {
                email: Some("dup@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(unchanged.is_some());
    assert_eq!(repo.list_users(Pagination::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_memory_delete_user_cascades_everything_they_own() {
    let repo = InMemoryRepository::new();
    let author = create_test_user(&repo, "author@example.com").await;
    let student = create_test_user(&repo, "student@example.com").await;

    let owned = repo.create_course(author.id, course("Owned")).await.unwrap();
    let owned_lesson = repo.create_lesson(lesson(owned.id, "L1")).await.unwrap();
    let other = repo.create_course(student.id, course("Other")).await.unwrap();
    let other_lesson = repo.create_lesson(lesson(other.id, "L2")).await.unwrap();

    repo.enroll(student.id, owned.id).await.unwrap();
    repo.create_comment(student.id, owned_lesson.id, "on owned".to_string()).await.unwrap();
    repo.create_comment(author.id, other_lesson.id, "by author".to_string()).await.unwrap();
    repo.upsert_rating(author.id, other_lesson.id, 5).await.unwrap();
    repo.enroll(author.id, other.id).await.unwrap();

    let deleted = repo.delete_user(author.id).await.unwrap().unwrap();
    assert_eq!(deleted.id, author.id);

    // Their course and everything under it is gone.
    assert!(repo.get_course(owned.id).await.unwrap().is_none());
    assert!(repo.get_lesson(owned_lesson.id).await.unwrap().is_none());
    assert!(repo.find_enrollment(student.id, owned.id).await.unwrap().is_none());

    // Their activity elsewhere is gone, the other course stays.
    assert!(repo.get_course(other.id).await.unwrap().is_some());
    assert!(repo.list_comments(Pagination::default()).await.unwrap().is_empty());
    assert!(repo.list_ratings(Pagination::default()).await.unwrap().is_empty());
    assert!(repo.list_enrolled_users(other.id, Pagination::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_upsert_rating_keeps_one_row_per_user_and_lesson() {
    let repo = InMemoryRepository::new();
    let user = create_test_user(&repo, "a@example.com").await;
    let other = create_test_user(&repo, "b@example.com").await;
    let c = repo.create_course(user.id, course("C")).await.unwrap();
    let l = repo.create_lesson(lesson(c.id, "L")).await.unwrap();

    let first = repo.upsert_rating(user.id, l.id, 2).await.unwrap();
    let second = repo.upsert_rating(user.id, l.id, 5).await.unwrap();
    repo.upsert_rating(other.id, l.id, 4).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.stars, 5);
    assert_eq!(repo.list_ratings_by_lesson(l.id, Pagination::default()).await.unwrap().len(), 2);
    assert_eq!(repo.average_rating(l.id).await.unwrap(), 4.5);
}

#[tokio::test]
async fn test_memory_enroll_is_idempotent() {
    let repo = InMemoryRepository::new();
    let user = create_test_user(&repo, "a@example.com").await;
    let c = repo.create_course(user.id, course("C")).await.unwrap();

    let first = repo.enroll(user.id, c.id).await.unwrap();
    let again = repo.enroll(user.id, c.id).await.unwrap();

    assert_eq!(first, again);
    assert_eq!(repo.list_enrollments(Pagination::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_memory_course_title_filter_and_pagination() {
    let repo = InMemoryRepository::new();
    let user = create_test_user(&repo, "a@example.com").await;
    for title in ["Intro to Rust", "Python Basics", "Advanced RUST", "Go"] {
        repo.create_course(user.id, course(title)).await.unwrap();
    }

    let rust: Vec<String> = repo
        .list_courses(Some("rust"), Pagination::default())
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.title)
        .collect();
    assert_eq!(rust, vec!["Intro to Rust", "Advanced RUST"]);

    let window = repo.list_courses(None, Pagination::new(1, 2)).await.unwrap();
    assert_eq!(
        window.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
        vec!["Python Basics", "Advanced RUST"]
    );

    let renamed = repo
        .update_course(
            window[0].id,
            UpdateCourseRequest {
                title: Some("Python for Rustaceans".to_string()),
                description: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.author_id, user.id);
    assert_eq!(repo.list_courses(Some("RUST"), Pagination::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_memory_rankings() {
    let repo = InMemoryRepository::new();
    let a = create_test_user(&repo, "a@example.com").await;
    let b = create_test_user(&repo, "b@example.com").await;
    let quiet = repo.create_course(a.id, course("Quiet")).await.unwrap();
    let busy = repo.create_course(a.id, course("Busy")).await.unwrap();
    let l1 = repo.create_lesson(lesson(busy.id, "L1")).await.unwrap();
    let l2 = repo.create_lesson(lesson(busy.id, "L2")).await.unwrap();

    repo.enroll(a.id, busy.id).await.unwrap();
    repo.enroll(b.id, busy.id).await.unwrap();
    repo.enroll(b.id, quiet.id).await.unwrap();
    repo.create_comment(b.id, l2.id, "hi".to_string()).await.unwrap();
    repo.upsert_rating(b.id, l2.id, 3).await.unwrap();
    repo.upsert_rating(a.id, l2.id, 5).await.unwrap();

    let courses = repo.popular_courses(5).await.unwrap();
    assert_eq!(courses[0].id, busy.id);
    assert_eq!(courses[0].enrollment_count, 2);
    assert_eq!(courses[1].enrollment_count, 1);

    let lessons = repo.popular_lessons(1).await.unwrap();
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0].id, l2.id);
    assert_eq!((lessons[0].comment_count, lessons[0].rating_count), (1, 2));
    assert_eq!(lessons[0].avg_rating, 4.0);
    assert_ne!(lessons[0].id, l1.id);

    let users = repo.active_users(5).await.unwrap();
    assert_eq!(users[0].id, b.id);
    assert_eq!(users[0].activity_score, 4);
    assert_eq!(users[1].activity_score, 2);

    let stats = repo.platform_stats().await.unwrap();
    assert_eq!(stats.total_lessons, 2);
    assert_eq!(stats.total_ratings, 2);
    assert_eq!(stats.average_rating, 4.0);
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let repo = InMemoryRepository::new();
    let config = AppConfig::default();

    seed::init_db(&repo, &config).await.unwrap();
    let first = repo.dashboard_counts().await.unwrap();
    seed::init_db(&repo, &config).await.unwrap();
    let second = repo.dashboard_counts().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.users_count, 2);
    assert_eq!(first.courses_count, 1);
    assert_eq!(first.lessons_count, 2);
    assert_eq!(first.enrollments_count, 1);

    let admin = repo.get_user_by_email("admin@example.com").await.unwrap().unwrap();
    assert!(admin.is_admin);
}

#[tokio::test]
async fn test_seed_in_production_only_creates_configured_admin() {
    let repo = InMemoryRepository::new();
    let config = AppConfig {
        env: Env::Production,
        first_admin_email: Some("ops@example.com".to_string()),
        first_admin_password: Some("s3cret".to_string()),
        ..AppConfig::default()
    };

    seed::init_db(&repo, &config).await.unwrap();

    let users = repo.list_users(Pagination::default()).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "ops@example.com");
    assert_eq!(repo.dashboard_counts().await.unwrap().courses_count, 0);
}

// --- Postgres (skipped when DATABASE_URL is not set) ---

async fn postgres_repository() -> Option<PostgresRepository> {
    dotenv::dotenv().ok();
    let db_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&db_url)
        .await
        .expect("Failed to connect to database for integration tests.");
    let repo = PostgresRepository::new(pool);
    repo.migrate().await.expect("Failed to run database migrations.");
    Some(repo)
}

fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
async fn test_postgres_course_lifecycle_and_cascade() {
    let Some(repo) = postgres_repository().await else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return;
    };

    let author = create_test_user(&repo, &unique_email("author")).await;
    let student = create_test_user(&repo, &unique_email("student")).await;
    let created = repo.create_course(author.id, course("Postgres Course")).await.unwrap();
    let l = repo.create_lesson(lesson(created.id, "Joins")).await.unwrap();

    let first = repo.enroll(student.id, created.id).await.unwrap();
    assert_eq!(repo.enroll(student.id, created.id).await.unwrap().id, first.id);

    let r1 = repo.upsert_rating(student.id, l.id, 1).await.unwrap();
    let r2 = repo.upsert_rating(student.id, l.id, 4).await.unwrap();
    assert_eq!(r1.id, r2.id);
    assert_eq!(repo.average_rating(l.id).await.unwrap(), 4.0);

    let comment = repo.create_comment(student.id, l.id, "solid".to_string()).await.unwrap();
    let edited = repo.update_comment(comment.id, None).await.unwrap().unwrap();
    assert_eq!(edited.text, "solid");

    let updated = repo
        .update_course(
            created.id,
            UpdateCourseRequest {
                title: None,
                description: Some("Now with a description".to_string()),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Postgres Course");
    assert_eq!(updated.description.as_deref(), Some("Now with a description"));

    repo.delete_course(created.id).await.unwrap().unwrap();
    assert!(repo.get_lesson(l.id).await.unwrap().is_none());
    assert!(repo.get_rating(r1.id).await.unwrap().is_none());
    assert!(repo.get_comment(comment.id).await.unwrap().is_none());
    assert!(repo.find_enrollment(student.id, created.id).await.unwrap().is_none());

    repo.delete_user(author.id).await.unwrap();
    repo.delete_user(student.id).await.unwrap();
}

#[tokio::test]
async fn test_postgres_unique_email_violation_maps_to_duplicate() {
    let Some(repo) = postgres_repository().await else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return;
    };

    let email = unique_email("dup");
    let user = create_test_user(&repo, &email).await;
    let err = repo
        .create_user(NewUser {
            full_name: "Second".to_string(),
            email: email.clone(),
            hashed_password: "hash".to_string(),
            is_active: true,
            is_admin: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));
    assert_eq!(ApiError::from(err).status(), StatusCode::BAD_REQUEST);

    repo.delete_user(user.id).await.unwrap();
}

#[tokio::test]
async fn test_postgres_missing_rows_are_none() {
    let Some(repo) = postgres_repository().await else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return;
    };

    assert!(repo.get_user(i64::MAX).await.unwrap().is_none());
    assert!(repo.delete_course(i64::MAX).await.unwrap().is_none());
    assert!(repo.update_rating(i64::MAX, Some(3)).await.unwrap().is_none());
    assert_eq!(repo.average_rating(i64::MAX).await.unwrap(), 0.0);
}
