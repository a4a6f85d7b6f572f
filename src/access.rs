//! Authorization rules.
//!
//! Authentication answers *who* is calling ([`AuthUser`]); this module answers whether
//! that user may perform an [`Action`] on a [`Resource`]. The rules are pure functions
//! over already loaded rows, so handlers fetch what they need and then call [`authorize`].

use crate::{auth::AuthUser, error::ApiError, models::Course};

pub const NOT_ENOUGH_PERMISSIONS: &str = "Not enough permissions";
pub const NOT_ENOUGH_PRIVILEGES: &str = "The user doesn't have enough privileges";

/// The operation being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Comment,
    Rate,
    /// Listing the users enrolled in a course.
    ListMembers,
}

/// What the action targets.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// A course itself (metadata, not its lessons).
    Course(&'a Course),
    /// Lessons of a course and everything hanging off them.
    CourseContent { course: &'a Course, enrolled: bool },
    /// A comment, rating or enrollment, owned by its creator.
    Owned { owner_id: i64 },
    /// A user account.
    Account { user_id: i64 },
    /// Account management and the admin area.
    AdminArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

/// decide
///
/// Evaluates the rules for one request. Admins are allowed everything.
pub fn decide(user: &AuthUser, resource: Resource<'_>, action: Action) -> Decision {
    if user.is_admin {
        return Decision::Allow;
    }

    let allowed_if = |condition: bool, reason: &'static str| {
        if condition { Decision::Allow } else { Decision::Deny(reason) }
    };

    match resource {
        Resource::Course(course) => match action {
            Action::Read | Action::Create => Decision::Allow,
            _ => allowed_if(course.author_id == user.id, NOT_ENOUGH_PERMISSIONS),
        },
        Resource::CourseContent { course, enrolled } => {
            let is_author = course.author_id == user.id;
            match action {
                Action::Read => allowed_if(
                    enrolled || is_author,
                    "You must be enrolled in this course to view lessons",
                ),
                Action::Comment => allowed_if(
                    enrolled || is_author,
                    "You must be enrolled in this course to comment on lessons",
                ),
                Action::Rate => allowed_if(
                    enrolled || is_author,
                    "You must be enrolled in this course to rate lessons",
                ),
                Action::Create | Action::Update | Action::Delete | Action::ListMembers => {
                    allowed_if(is_author, NOT_ENOUGH_PERMISSIONS)
                }
            }
        }
        Resource::Owned { owner_id } => allowed_if(owner_id == user.id, NOT_ENOUGH_PERMISSIONS),
        Resource::Account { user_id } => match action {
            Action::Read | Action::Update => allowed_if(user_id == user.id, NOT_ENOUGH_PRIVILEGES),
            _ => Decision::Deny(NOT_ENOUGH_PRIVILEGES),
        },
        Resource::AdminArea => Decision::Deny(NOT_ENOUGH_PRIVILEGES),
    }
}

/// authorize
///
/// [`decide`], with a denial mapped onto a 403.
pub fn authorize(user: &AuthUser, resource: Resource<'_>, action: Action) -> Result<(), ApiError> {
    match decide(user, resource, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::debug!(user_id = user.id, ?action, reason, "access denied");
            Err(ApiError::forbidden(reason))
        }
    }
}

/// Shorthand for endpoints reserved to administrators.
pub fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    authorize(user, Resource::AdminArea, Action::Read)
}
