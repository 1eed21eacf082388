/// Database layer for TiK
///
/// # Modules
///
/// - `pool`: SQLite connection pool (the store-handle factory) with health checks
/// - `migrations`: embedded schema migrations
/// - `session`: request-scoped transactional handle
///
/// Entity persistence lives in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use tik_shared::db::pool::{create_pool, DatabaseConfig};
/// use tik_shared::db::session::DbSession;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: "sqlite://tik.db?mode=rwc".to_string(),
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     let session = DbSession::new(pool);
///     session.close().await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod session;
