use chrono::Utc;
use learning_platform::models::{
    Comment, Course, CourseFilter, CreateUserRequest, CourseWithLessons, Lesson, LessonWithDetails,
    Pagination, Rating, Token, TopParams, UpdateCourseRequest, User, UserProfile, MAX_PAGE_SIZE,
};
use serde_json::{Value, json};

// --- Tests ---

#[test]
fn test_user_profile_never_exposes_password_hash() {
    let user = User {
        id: 7,
        full_name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        hashed_password: "$argon2id$secret".to_string(),
        is_active: true,
        is_admin: false,
    };

    let json_output = serde_json::to_string(&UserProfile::from(user)).unwrap();

    assert!(json_output.contains(r#""email":"ada@example.com""#));
    assert!(!json_output.contains("hashed_password"));
    assert!(!json_output.contains("argon2"));
}

#[test]
fn test_course_with_lessons_is_flattened() {
    let detail = CourseWithLessons {
        course: Course {
            id: 1,
            title: "Rust".to_string(),
            description: None,
            author_id: 3,
        },
        lessons: vec![Lesson {
            id: 10,
            course_id: 1,
            title: "Borrowing".to_string(),
            ..Default::default()
        }],
    };

    let value = serde_json::to_value(&detail).unwrap();

    // Course fields sit at the top level, next to `lessons`.
    assert_eq!(value["id"], 1);
    assert_eq!(value["author_id"], 3);
    assert!(value.get("course").is_none());
    assert_eq!(value["lessons"][0]["title"], "Borrowing");
}

#[test]
fn test_lesson_with_details_is_flattened() {
    let detail = LessonWithDetails {
        lesson: Lesson {
            id: 10,
            course_id: 1,
            title: "Borrowing".to_string(),
            ..Default::default()
        },
        comments: vec![Comment {
            id: 1,
            user_id: 2,
            lesson_id: 10,
            text: "Nice".to_string(),
            created_at: Utc::now(),
        }],
        ratings: vec![Rating {
            id: 1,
            user_id: 2,
            lesson_id: 10,
            stars: 4,
        }],
        average_rating: 4.0,
    };

    let value = serde_json::to_value(&detail).unwrap();

    assert_eq!(value["id"], 10);
    assert_eq!(value["course_id"], 1);
    assert!(value.get("lesson").is_none());
    assert_eq!(value["comments"][0]["text"], "Nice");
    assert_eq!(value["ratings"][0]["stars"], 4);
    assert_eq!(value["average_rating"], 4.0);
}

#[test]
fn test_token_skips_unset_optional_fields() {
    let plain = Token {
        access_token: "abc".to_string(),
        token_type: "bearer".to_string(),
        ..Default::default()
    };
    assert_eq!(
        serde_json::to_value(&plain).unwrap(),
        json!({"access_token": "abc", "token_type": "bearer"})
    );

    let rich = Token {
        bearer_format: Some("Bearer abc".to_string()),
        user_id: Some(5),
        is_admin: Some(true),
        ..plain
    };
    let value = serde_json::to_value(&rich).unwrap();
    assert_eq!(value["bearer_format"], "Bearer abc");
    assert_eq!(value["user_id"], 5);
    assert_eq!(value["is_admin"], true);
}

#[test]
fn test_update_course_request_optionality() {
    let partial = UpdateCourseRequest {
        title: Some("New title".to_string()),
        description: None,
    };

    let json_output = serde_json::to_string(&partial).unwrap();
    assert!(json_output.contains("New title"));
    assert!(!json_output.contains("description"));

    let parsed: UpdateCourseRequest = serde_json::from_str("{}").unwrap();
    assert!(parsed.title.is_none());
    assert!(parsed.description.is_none());
}

#[test]
fn test_create_user_request_defaults() {
    let request: CreateUserRequest = serde_json::from_value(json!({
        "full_name": "Bob",
        "email": "bob@example.com",
        "password": "hunter2"
    }))
    .unwrap();

    assert!(!request.is_admin);
    assert!(request.is_active);
}

#[test]
fn test_pagination_clamps_window() {
    let page = Pagination::new(-5, 1_000);
    assert_eq!(page.offset(), 0);
    assert_eq!(page.limit(), MAX_PAGE_SIZE);

    let page = Pagination::new(2, 2);
    assert_eq!(page.apply(1..=10), vec![3, 4]);

    let page = Pagination::new(0, -1);
    assert!(page.apply(1..=10).is_empty());
}

#[test]
fn test_query_parameter_defaults() {
    let page: Pagination = serde_json::from_value(json!({})).unwrap();
    assert_eq!((page.skip, page.limit), (0, MAX_PAGE_SIZE));

    let filter: CourseFilter = serde_json::from_value(json!({"title": "py", "skip": 3})).unwrap();
    assert_eq!(filter.title.as_deref(), Some("py"));
    assert_eq!(filter.page().offset(), 3);
    assert_eq!(filter.page().limit(), MAX_PAGE_SIZE);

    let top: TopParams = serde_json::from_value(Value::Object(Default::default())).unwrap();
    assert_eq!(top.limit, 5);
}
