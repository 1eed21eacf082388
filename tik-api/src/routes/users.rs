/// User endpoints
///
/// # Endpoints
///
/// - `POST /users/` - Create a user
/// - `GET /users/?page=1&size=50` - List users (paginated)
/// - `GET /users/:id` - Get a user with everything they created
/// - `PUT /users/:id` - Partially update a user
/// - `DELETE /users/:id` - Delete a user and, by cascade, their projects,
///   tickets and comments
///
/// Passwords arrive in plaintext and are hashed before they reach the store.
/// No read-model ever carries the hash.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{PatchRules, ResourceId, Session, ValidatedJson},
    guard::guard,
    pagination::{Page, PageParams},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tik_shared::{
    models::user::{CreateUser, UpdateUser, User, UserView},
    patch::Patch,
};
use tracing::info;
use validator::{Validate, ValidationErrors};

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        max = 50,
        code = "string_too_long",
        message = "String should have at most 50 characters"
    ))]
    pub first_name: String,

    #[validate(length(
        max = 50,
        code = "string_too_long",
        message = "String should have at most 50 characters"
    ))]
    pub last_name: String,

    #[validate(length(
        max = 50,
        code = "string_too_long",
        message = "String should have at most 50 characters"
    ))]
    pub username: String,

    #[validate(email(code = "value_error", message = "value is not a valid email address"))]
    pub email: String,

    #[validate(length(
        max = 20,
        code = "string_too_long",
        message = "String should have at most 20 characters"
    ))]
    pub role: String,

    /// Plaintext password, at least 8 characters
    #[validate(length(
        min = 8,
        code = "string_too_short",
        message = "String should have at least 8 characters"
    ))]
    pub password: String,
}

/// Update user request
///
/// Omitted fields are left untouched. A new password is rehashed.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
    #[serde(default)]
    pub username: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub role: Patch<String>,
    #[serde(default)]
    pub password: Patch<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        PatchRules::new()
            .max_chars("first_name", &self.first_name, 50)
            .max_chars("last_name", &self.last_name, 50)
            .max_chars("username", &self.username, 50)
            .email("email", &self.email)
            .max_chars("role", &self.role, 20)
            .min_chars("password", &self.password, 8)
            .finish()
    }
}

fn not_found(id: i64) -> String {
    format!("User with ID {} not found", id)
}

/// Create a user
///
/// ```text
/// POST /users/
/// {
///   "first_name": "John",
///   "last_name": "Doe",
///   "username": "johndoe",
///   "email": "johndoe@example.com",
///   "role": "user",
///   "password": "password123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Username or email already taken
/// - `422 Unprocessable Entity`: Body failed validation
pub async fn create(
    State(state): State<AppState>,
    Session(session): Session,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    info!(username = %req.username, "Attempting to create a new user");

    let password_hash = state.hasher.hash(&req.password)?;

    let id = {
        let mut conn = session.connection().await?;
        User::create(
            &mut conn,
            CreateUser {
                first_name: req.first_name,
                last_name: req.last_name,
                username: req.username,
                email: req.email,
                role: req.role,
                password_hash,
            },
        )
        .await?
    };
    session.commit().await?;

    let mut conn = session.connection().await?;
    let user = guard(User::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = UserView::load(&mut conn, &user).await?;

    info!(id, "User created successfully");
    Ok((StatusCode::CREATED, Json(view)))
}

/// List users, one page at a time
///
/// An out-of-range page is reported as `404 No users found`.
pub async fn list(
    Session(session): Session,
    params: PageParams,
) -> ApiResult<Json<Page<UserView>>> {
    info!(page = params.page, size = params.size, "Attempting to retrieve users");

    let mut conn = session.connection().await?;
    let total = User::count(&mut conn).await?;
    let users = guard(
        User::list_page(&mut conn, params.limit(), params.offset()).await?,
        "No users found",
    )?;

    let mut items = Vec::with_capacity(users.len());
    for user in &users {
        items.push(UserView::load(&mut conn, user).await?);
    }

    info!(count = items.len(), total, "Users retrieved successfully");
    Ok(Json(Page::new(items, total, params, "/users/")))
}

pub async fn get(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<UserView>> {
    info!(id, "Attempting to retrieve user");

    let mut conn = session.connection().await?;
    let user = guard(User::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = UserView::load(&mut conn, &user).await?;

    info!(id, "User retrieved successfully");
    Ok(Json(view))
}

/// Partially update a user
///
/// An empty body returns the user unchanged.
pub async fn update(
    State(state): State<AppState>,
    Session(session): Session,
    ResourceId(id): ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserView>> {
    info!(id, "Attempting to update user");

    let password_hash = match req.password {
        Patch::Value(password) => Patch::Value(state.hasher.hash(&password)?),
        Patch::Null => Patch::Null,
        Patch::Unset => Patch::Unset,
    };

    let changes = UpdateUser {
        first_name: req.first_name,
        last_name: req.last_name,
        username: req.username,
        email: req.email,
        role: req.role,
        password_hash,
    };

    {
        let mut conn = session.connection().await?;
        let user = guard(User::find_by_id(&mut conn, id).await?, not_found(id))?;

        if changes.is_empty() {
            info!(id, "No changes supplied for user");
            return Ok(Json(UserView::load(&mut conn, &user).await?));
        }

        if !User::update(&mut conn, id, changes).await? {
            return Err(ApiError::stale("UPDATE", "users"));
        }
    }
    session.commit().await?;

    let mut conn = session.connection().await?;
    let user = guard(User::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = UserView::load(&mut conn, &user).await?;

    info!(id, "User updated successfully");
    Ok(Json(view))
}

pub async fn delete(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    info!(id, "Attempting to delete user");

    {
        let mut conn = session.connection().await?;
        guard(User::find_by_id(&mut conn, id).await?, not_found(id))?;

        if !User::delete(&mut conn, id).await? {
            return Err(ApiError::stale("DELETE", "users"));
        }
    }
    session.commit().await?;

    info!(id, "User deleted successfully");
    Ok(StatusCode::OK)
}
