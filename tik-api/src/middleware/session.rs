/// Session scope middleware
///
/// Wraps every request in its own [`DbSession`]:
///
/// 1. A session is created from the pool and inserted into the request
///    extensions, where the [`Session`](crate::extract::Session) extractor
///    finds it. No connection is taken until a handler first uses it.
/// 2. If the response carries an [`ErrorReport`], the session is rolled back
///    and the error is logged. In debug mode the response is replaced with a
///    500 plain-text dump of the error.
/// 3. The session is closed on every path. Closing never commits, so a
///    handler that failed before its commit leaves nothing behind.
///
/// If the request future is dropped mid-flight, the last handle to the
/// session drops with it and sqlx rolls the open transaction back.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use sqlx::SqlitePool;
/// use tik_api::middleware::session::SessionLayer;
///
/// # fn example(pool: SqlitePool) {
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(SessionLayer::new(pool, false));
/// # }
/// ```

use crate::error::ErrorReport;
use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    response::Response,
};
use sqlx::SqlitePool;
use std::task::{Context, Poll};
use tik_shared::db::session::DbSession;
use tower::{Layer, Service};
use tracing::{error, warn};

/// Session scope layer
#[derive(Clone)]
pub struct SessionLayer {
    pool: SqlitePool,

    /// Whether failed requests answer with a diagnostic dump
    debug: bool,
}

impl SessionLayer {
    pub fn new(pool: SqlitePool, debug: bool) -> Self {
        Self { pool, debug }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            pool: self.pool.clone(),
            debug: self.debug,
        }
    }
}

/// Session scope middleware service
#[derive(Clone)]
pub struct SessionMiddleware<S> {
    inner: S,
    pool: SqlitePool,
    debug: bool,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let session = DbSession::new(self.pool.clone());
        request.extensions_mut().insert(session.clone());

        let future = self.inner.call(request);
        let debug = self.debug;

        Box::pin(async move {
            let result = future.await;

            let response = match result {
                Ok(mut response) => {
                    if let Some(report) = response.extensions_mut().remove::<ErrorReport>() {
                        if let Err(e) = session.rollback().await {
                            warn!(error = %e, "Failed to roll back session");
                        }

                        error!(
                            category = report.category.label(),
                            status = report.category.status().as_u16(),
                            "{}",
                            report.message
                        );

                        if debug {
                            response = debug_response(&report);
                        }
                    }
                    Ok(response)
                }
                Err(e) => Err(e),
            };

            if let Err(e) = session.close().await {
                warn!(error = %e, "Failed to close session");
            }

            response
        })
    }
}

/// Plain-text diagnostic response used in debug mode
fn debug_response(report: &ErrorReport) -> Response {
    let body = format!(
        "{} ({})\n\n{}",
        report.category.label(),
        report.category.status(),
        report.detail
    );

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::extract::Session;
    use axum::{
        response::IntoResponse,
        routing::{get, post},
        Router,
    };
    use std::time::Duration;
    use tower::Service as _;

    async fn lazy_pool() -> SqlitePool {
        sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn notes_pool(dir: &tempfile::TempDir) -> SqlitePool {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("notes.db").display());
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();

        sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_dropped_request_discards_uncommitted_work() {
        async fn handler(Session(session): Session) -> Result<(), ApiError> {
            {
                let mut conn = session.connection().await?;
                sqlx::query("INSERT INTO notes (body) VALUES ('draft')")
                    .execute(&mut *conn)
                    .await?;
            }

            std::future::pending::<()>().await;
            session.commit().await?;
            Ok(())
        }

        let dir = tempfile::tempdir().unwrap();
        let pool = notes_pool(&dir).await;

        let mut app = Router::new()
            .route("/", post(handler))
            .layer(SessionLayer::new(pool.clone(), false));

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let outcome = tokio::time::timeout(Duration::from_millis(200), app.call(request)).await;
        assert!(outcome.is_err(), "handler should still be pending");

        // Single-connection pool: this only runs once the dropped request gave its connection back
        let count: i64 = tokio::time::timeout(
            Duration::from_secs(5),
            sqlx::query_scalar("SELECT COUNT(*) FROM notes").fetch_one(&pool),
        )
        .await
        .expect("connection should return to the pool")
        .unwrap();
        assert_eq!(count, 0);

        sqlx::query("INSERT INTO notes (body) VALUES ('kept')")
            .execute(&pool)
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_stale_write_rolls_back_with_conflict() {
        async fn handler(Session(session): Session) -> Result<(), ApiError> {
            {
                let mut conn = session.connection().await?;
                sqlx::query("INSERT INTO notes (body) VALUES ('draft')")
                    .execute(&mut *conn)
                    .await?;

                let result = sqlx::query("UPDATE notes SET body = 'final' WHERE id = 42")
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(ApiError::stale("UPDATE", "notes"));
                }
            }
            session.commit().await?;
            Ok(())
        }

        let dir = tempfile::tempdir().unwrap();
        let pool = notes_pool(&dir).await;

        let mut app = Router::new()
            .route("/", post(handler))
            .layer(SessionLayer::new(pool.clone(), false));

        let response = app
            .call(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status_code"], 409);
        assert_eq!(
            json["message"],
            "UPDATE statement on table 'notes' expected to affect 1 row(s); 0 were matched."
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_session_is_available_and_closed() {
        async fn handler(Session(session): Session) -> impl IntoResponse {
            session.is_closed().await.to_string()
        }

        let mut app = Router::new()
            .route("/", get(handler))
            .layer(SessionLayer::new(lazy_pool().await, false));

        let response = app
            .call(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"false");
    }

    #[tokio::test]
    async fn test_error_report_is_consumed() {
        async fn handler() -> Result<(), ApiError> {
            Err(ApiError::NotFound("Category with ID 1 not found".to_string()))
        }

        let mut app = Router::new()
            .route("/", get(handler))
            .layer(SessionLayer::new(lazy_pool().await, false));

        let response = app
            .call(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_none());
    }

    #[tokio::test]
    async fn test_debug_mode_dumps_error() {
        async fn handler() -> Result<(), ApiError> {
            Err(ApiError::Integrity("UNIQUE constraint failed: categories.label".to_string()))
        }

        let mut app = Router::new()
            .route("/", get(handler))
            .layer(SessionLayer::new(lazy_pool().await, true));

        let response = app
            .call(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("IntegrityError"));
        assert!(text.contains("UNIQUE constraint failed"));
    }
}
