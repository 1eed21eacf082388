/// API route handlers
///
/// One module per resource:
///
/// - `health`: Home message and health check
/// - `auth`: Token issuance and the current user
/// - `labels`: Categories, levels and statuses (shared handlers)
/// - `users`, `projects`, `tickets`, `comments`: Entity CRUD
///
/// Every CRUD handler follows the same path: validate, fetch, guard, mutate,
/// commit, reload. Failures propagate as [`crate::error::ApiError`] and the
/// session layer rolls back.

pub mod auth;
pub mod comments;
pub mod health;
pub mod labels;
pub mod projects;
pub mod tickets;
pub mod users;
