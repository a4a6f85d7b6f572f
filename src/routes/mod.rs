//! Router Module Index
//!
//! Organizes the routing logic into access-segregated modules. Access control is
//! applied per module (via Axum layers in `create_router`), so a route's position
//! decides whether a credential is required at all.

/// Routes accessible to anonymous clients: login, token issuance and registration.
pub mod public;

/// Routes protected by the `AuthUser` middleware. Ownership and enrollment rules are
/// checked inside the handlers.
pub mod authenticated;

/// The admin area: JSON listings behind authentication plus the cookie session flow.
pub mod admin;
