/// Middleware modules for the API server
///
/// - `session`: Per-request database session scope and error rollback

pub mod session;
