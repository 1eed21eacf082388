//! # TiK Shared Library
//!
//! Storage, models and authentication primitives for the TiK ticket tracker.
//! The HTTP layer lives in `tik-api`; everything it persists goes through
//! this crate.
//!
//! ## Module Organization
//!
//! - `db`: connection pool, migrations and the request-scoped session
//! - `models`: entities, their persistence operations and read-models
//! - `auth`: password hashing and JWT access tokens
//! - `patch`: unset-aware field wrapper for partial updates

pub mod auth;
pub mod db;
pub mod models;
pub mod patch;

/// Current version of the TiK shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
