use learning_platform::{
    access::{self, Action, Decision, NOT_ENOUGH_PERMISSIONS, Resource, decide},
    auth::AuthUser,
    models::Course,
};

fn user(id: i64, is_admin: bool) -> AuthUser {
    AuthUser {
        id,
        email: format!("u{id}@example.com"),
        full_name: format!("User {id}"),
        is_active: true,
        is_admin,
    }
}

fn course(author_id: i64) -> Course {
    Course {
        id: 1,
        title: "Rust".into(),
        description: None,
        author_id,
    }
}

#[test]
fn test_admin_bypasses_every_rule() {
    let admin = user(99, true);
    let c = course(1);
    for action in [Action::Read, Action::Update, Action::Delete, Action::Rate, Action::ListMembers] {
        assert_eq!(
            decide(&admin, Resource::CourseContent { course: &c, enrolled: false }, action),
            Decision::Allow
        );
    }
    assert_eq!(decide(&admin, Resource::AdminArea, Action::Read), Decision::Allow);
    assert_eq!(decide(&admin, Resource::Owned { owner_id: 1 }, Action::Delete), Decision::Allow);
    assert_eq!(decide(&admin, Resource::Account { user_id: 1 }, Action::Delete), Decision::Allow);
}

#[test]
fn test_course_mutation_requires_author() {
    let c = course(1);
    assert_eq!(decide(&user(1, false), Resource::Course(&c), Action::Update), Decision::Allow);
    assert_eq!(
        decide(&user(2, false), Resource::Course(&c), Action::Delete),
        Decision::Deny(NOT_ENOUGH_PERMISSIONS)
    );
    // Reading and creating courses is open to everyone signed in.
    assert_eq!(decide(&user(2, false), Resource::Course(&c), Action::Read), Decision::Allow);
    assert_eq!(decide(&user(2, false), Resource::Course(&c), Action::Create), Decision::Allow);
}

#[test]
fn test_lesson_interaction_requires_enrollment_or_authorship() {
    let c = course(1);
    let outsider = user(2, false);
    let content = Resource::CourseContent { course: &c, enrolled: false };

    assert_eq!(
        decide(&outsider, content, Action::Read),
        Decision::Deny("You must be enrolled in this course to view lessons")
    );
    assert_eq!(
        decide(&outsider, content, Action::Comment),
        Decision::Deny("You must be enrolled in this course to comment on lessons")
    );
    assert_eq!(
        decide(&outsider, content, Action::Rate),
        Decision::Deny("You must be enrolled in this course to rate lessons")
    );

    let enrolled = Resource::CourseContent { course: &c, enrolled: true };
    assert_eq!(decide(&outsider, enrolled, Action::Rate), Decision::Allow);
    assert_eq!(decide(&outsider, enrolled, Action::Comment), Decision::Allow);
    // Enrollment alone does not grant editing rights.
    assert!(matches!(decide(&outsider, enrolled, Action::Update), Decision::Deny(_)));
    assert!(matches!(decide(&outsider, enrolled, Action::ListMembers), Decision::Deny(_)));

    // The author needs no enrollment.
    assert_eq!(decide(&user(1, false), content, Action::Rate), Decision::Allow);
    assert_eq!(decide(&user(1, false), content, Action::Create), Decision::Allow);
}

#[test]
fn test_owned_rows_are_creator_only() {
    let me = user(5, false);
    for action in [Action::Read, Action::Update, Action::Delete] {
        assert_eq!(decide(&me, Resource::Owned { owner_id: 5 }, action), Decision::Allow);
        assert_eq!(
            decide(&me, Resource::Owned { owner_id: 6 }, action),
            Decision::Deny(NOT_ENOUGH_PERMISSIONS)
        );
    }
}

#[test]
fn test_accounts_are_self_service_only() {
    let me = user(5, false);
    assert_eq!(decide(&me, Resource::Account { user_id: 5 }, Action::Read), Decision::Allow);
    assert_eq!(decide(&me, Resource::Account { user_id: 5 }, Action::Update), Decision::Allow);
    assert!(matches!(decide(&me, Resource::Account { user_id: 6 }, Action::Read), Decision::Deny(_)));
    assert!(matches!(decide(&me, Resource::Account { user_id: 5 }, Action::Delete), Decision::Deny(_)));
}

#[test]
fn test_authorize_maps_denial_to_forbidden() {
    let err = access::require_admin(&user(5, false)).unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    assert!(access::require_admin(&user(5, true)).is_ok());
}
