/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use tik_api::{app::AppState, config::Config};
/// use tik_shared::auth::password::PasswordHasher;
/// use tik_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let hasher = PasswordHasher::new(config.password.memory_kib)?;
/// let state = AppState::new(pool, config, hasher);
/// let app = tik_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::session::SessionLayer};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{get, post, MethodRouter},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tik_shared::auth::{jwt, password::PasswordHasher};
use tik_shared::models::label::{Category, Level, Status};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level as TraceLevel;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Password hashing capability
    pub hasher: Arc<PasswordHasher>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: SqlitePool, config: Config, hasher: PasswordHasher) -> Self {
        Self {
            db,
            config: Arc::new(config),
            hasher: Arc::new(hasher),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// GET  /                         # Welcome message
/// GET  /health                   # Health check
/// POST /auth/token               # Exchange credentials for a bearer token
/// GET  /auth/me                  # Current user (bearer token required)
///
/// /{resource}/                   # categories, levels, statuses, users,
///     POST   /                   #   projects, tickets, comments
///     GET    /                   # (also served without the trailing slash)
///     GET    /:id
///     PUT    /:id
///     DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Session scope (one `DbSession` per request, error rollback and logging)
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Bearer authentication (`/auth/me` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, comments, health, labels, projects, tickets, users};

    let me = get(auth::me).layer(axum::middleware::from_fn_with_state(
        state.clone(),
        jwt_auth_layer,
    ));

    let router = Router::new()
        .route("/", get(health::home))
        .route("/health", get(health::health_check))
        .route("/auth/token", post(auth::token))
        .route("/auth/me", me);

    let router = resource(
        router,
        "/categories",
        get(labels::list::<Category>).post(labels::create::<Category>),
        get(labels::get::<Category>)
            .put(labels::update::<Category>)
            .delete(labels::delete::<Category>),
    );
    let router = resource(
        router,
        "/levels",
        get(labels::list::<Level>).post(labels::create::<Level>),
        get(labels::get::<Level>)
            .put(labels::update::<Level>)
            .delete(labels::delete::<Level>),
    );
    let router = resource(
        router,
        "/statuses",
        get(labels::list::<Status>).post(labels::create::<Status>),
        get(labels::get::<Status>)
            .put(labels::update::<Status>)
            .delete(labels::delete::<Status>),
    );
    let router = resource(
        router,
        "/users",
        get(users::list).post(users::create),
        get(users::get).put(users::update).delete(users::delete),
    );
    let router = resource(
        router,
        "/projects",
        get(projects::list).post(projects::create),
        get(projects::get).put(projects::update).delete(projects::delete),
    );
    let router = resource(
        router,
        "/tickets",
        get(tickets::list).post(tickets::create),
        get(tickets::get).put(tickets::update).delete(tickets::delete),
    );
    let router = resource(
        router,
        "/comments",
        get(comments::list).post(comments::create),
        get(comments::get).put(comments::update).delete(comments::delete),
    );

    let session_layer = SessionLayer::new(state.db.clone(), state.config.api.debug);

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(TraceLevel::INFO))
                .on_response(DefaultOnResponse::new().level(TraceLevel::INFO)),
        )
        .layer(CorsLayer::permissive())
        .layer(session_layer)
        .with_state(state)
}

/// Mounts a collection at `{path}` and `{path}/`, and its items at `{path}/:id`
fn resource(
    router: Router<AppState>,
    path: &str,
    collection: MethodRouter<AppState>,
    item: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, collection.clone())
        .route(&format!("{}/", path), collection)
        .route(&format!("{}/:id", path), item)
}

/// Bearer token authentication middleware
///
/// Validates the JWT from the Authorization header and injects its claims
/// into the request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
