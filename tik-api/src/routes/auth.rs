/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/token` - Exchange username and password for a bearer token
/// - `GET /auth/me` - The authenticated user (requires `Authorization: Bearer`)
///
/// Tokens are HS256 JWTs whose subject is the username; they expire after
/// [`jwt::ACCESS_TOKEN_EXPIRE_MINUTES`]. There is no refresh flow.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Session, ValidatedJson},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tik_shared::{
    auth::jwt::{self, Claims},
    models::user::{User, UserSummary},
};
use tracing::{info, warn};
use validator::Validate;

/// Token request
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,

    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Issue an access token
///
/// ```text
/// POST /auth/token
/// { "username": "johndoe", "password": "password123" }
/// ```
///
/// ```json
/// { "access_token": "eyJ...", "token_type": "bearer", "expires_in": 1800 }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password
pub async fn token(
    State(state): State<AppState>,
    Session(session): Session,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    info!(username = %req.username, "Attempting to issue access token");

    let user = {
        let mut conn = session.connection().await?;
        User::find_by_username(&mut conn, &req.username).await?
    };

    let Some(user) = user else {
        warn!(username = %req.username, "Token requested for unknown user");
        return Err(invalid_credentials());
    };

    if !state.hasher.verify(&req.password, &user.password_hash)? {
        warn!(username = %req.username, "Token requested with wrong password");
        return Err(invalid_credentials());
    }

    let claims = Claims::new(user.username);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    info!(user_id = user.id, "Access token issued successfully");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: jwt::ACCESS_TOKEN_EXPIRE_MINUTES * 60,
    }))
}

/// The user the bearer token was issued to
pub async fn me(
    Session(session): Session,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserSummary>> {
    let mut conn = session.connection().await?;
    let user = User::find_by_username(&mut conn, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

    Ok(Json(user.summary()))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Incorrect username or password".to_string())
}
