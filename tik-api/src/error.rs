/// Error handling for the API server
///
/// Every failure a handler can produce is an [`ApiError`], a closed set of
/// categories. Handlers return `ApiResult<T>` and propagate with `?`; they
/// never pick status codes. The mapping from category to status lives in
/// [`ErrorCategory::policy`] and nowhere else.
///
/// Rendering happens in two steps. `IntoResponse` builds the JSON envelope
/// and attaches an [`ErrorReport`] to the response extensions. The session
/// layer ([`crate::middleware::session`]) then rolls back the request's
/// transaction, logs the report and, in debug mode, swaps the envelope for a
/// diagnostic dump.
///
/// # Response bodies
///
/// ```json
/// { "status_code": 404, "message": "Category with ID 42 not found" }
/// ```
///
/// ```json
/// {
///   "message": "Validation error",
///   "errors": [{ "loc": ["body", "label"], "msg": "...", "type": "string_too_long" }]
/// }
/// ```
///
/// # Example
///
/// ```
/// use tik_api::error::{ApiError, ApiResult};
///
/// fn find(id: i64) -> ApiResult<i64> {
///     if id == 1 {
///         Ok(id)
///     } else {
///         Err(ApiError::NotFound(format!("Category with ID {} not found", id)))
///     }
/// }
///
/// assert!(find(2).is_err());
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tik_shared::auth::{jwt::JwtError, password::PasswordError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Integrity,
    Operational,
    InvalidRequest,
    StaleData,
    Validation,
    Unauthorized,
}

impl ErrorCategory {
    /// Status code and log label for each category
    pub fn policy(self) -> (StatusCode, &'static str) {
        match self {
            ErrorCategory::Integrity => (StatusCode::BAD_REQUEST, "IntegrityError"),
            ErrorCategory::Operational => (StatusCode::INTERNAL_SERVER_ERROR, "OperationalError"),
            ErrorCategory::InvalidRequest => (StatusCode::BAD_REQUEST, "InvalidRequestError"),
            ErrorCategory::StaleData => (StatusCode::CONFLICT, "StaleDataError"),
            ErrorCategory::Validation => (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError"),
            ErrorCategory::NotFound => (StatusCode::NOT_FOUND, "NotFoundError"),
            ErrorCategory::Unauthorized => (StatusCode::UNAUTHORIZED, "UnauthorizedError"),
        }
    }

    pub fn status(self) -> StatusCode {
        self.policy().0
    }

    pub fn label(self) -> &'static str {
        self.policy().1
    }
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Entity or collection absent (404)
    NotFound(String),

    /// Unique, foreign-key, not-null or check constraint violated (400)
    Integrity(String),

    /// Store unavailable or failing (500)
    Operational(String),

    /// Malformed statement or undecodable data (400)
    InvalidRequest(String),

    /// Write matched no row after a successful fetch (409)
    StaleData(String),

    /// Path, query or body failed validation (422)
    Validation(Vec<ValidationErrorDetail>),

    /// Missing or bad credentials (401)
    Unauthorized(String),
}

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Location of the offending input, e.g. `["body", "email"]`
    pub loc: Vec<String>,

    /// Human-readable message
    pub msg: String,

    /// Machine-readable error kind, e.g. `string_too_long`
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationErrorDetail {
    pub fn new<L, S>(loc: L, msg: impl Into<String>, kind: impl Into<String>) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

/// Body for every category except validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
}

/// Body for validation failures
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub message: String,
    pub errors: Vec<ValidationErrorDetail>,
}

/// Attached to every error response for the session layer to act on
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub category: ErrorCategory,
    pub message: String,

    /// Full diagnostic text of the original error
    pub detail: String,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::NotFound(_) => ErrorCategory::NotFound,
            ApiError::Integrity(_) => ErrorCategory::Integrity,
            ApiError::Operational(_) => ErrorCategory::Operational,
            ApiError::InvalidRequest(_) => ErrorCategory::InvalidRequest,
            ApiError::StaleData(_) => ErrorCategory::StaleData,
            ApiError::Validation(_) => ErrorCategory::Validation,
            ApiError::Unauthorized(_) => ErrorCategory::Unauthorized,
        }
    }

    /// Client-facing message
    pub fn message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::Integrity(msg)
            | ApiError::Operational(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::StaleData(msg)
            | ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Validation(_) => "Validation error".to_string(),
        }
    }

    /// A write on `table` matched zero rows although the row was just fetched
    pub fn stale(statement: &str, table: &str) -> Self {
        ApiError::StaleData(format!(
            "{} statement on table '{}' expected to affect 1 row(s); 0 were matched.",
            statement, table
        ))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => write!(
                f,
                "{}: {} invalid field(s)",
                self.category().label(),
                errors.len()
            ),
            _ => write!(f, "{}: {}", self.category().label(), self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let category = self.category();
        let status = category.status();
        let report = ErrorReport {
            category,
            message: self.message(),
            detail: format!("{}\n\n{:#?}", self, self),
        };

        let mut response = match self {
            ApiError::Validation(errors) => (
                status,
                Json(ValidationErrorResponse {
                    message: report.message.clone(),
                    errors,
                }),
            )
                .into_response(),
            _ => (
                status,
                Json(ErrorResponse {
                    status_code: status.as_u16(),
                    message: report.message.clone(),
                }),
            )
                .into_response(),
        };

        response.extensions_mut().insert(report);
        response
    }
}

/// Classifies persistence failures
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => ApiError::Integrity(db_err.message().to_string()),
                _ => ApiError::Operational(db_err.message().to_string()),
            },
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::Protocol(_) => ApiError::InvalidRequest(err.to_string()),
            _ => ApiError::Operational(err.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Operational(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::Operational(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized("Could not validate credentials".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        assert_eq!(ErrorCategory::Integrity.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCategory::Operational.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCategory::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCategory::StaleData.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCategory::Validation.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ErrorCategory::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCategory::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("User with ID 3 not found".to_string());
        assert_eq!(err.to_string(), "NotFoundError: User with ID 3 not found");

        let err = ApiError::Validation(vec![ValidationErrorDetail::new(
            ["body", "email"],
            "value is not a valid email address",
            "value_error",
        )]);
        assert_eq!(err.to_string(), "ValidationError: 1 invalid field(s)");
        assert_eq!(err.message(), "Validation error");
    }

    #[test]
    fn test_into_response_attaches_report() {
        let response = ApiError::stale("UPDATE", "categories").into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.category, ErrorCategory::StaleData);
        assert!(report.message.contains("table 'categories'"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_pool_errors_are_operational() {
        assert_eq!(
            ApiError::from(sqlx::Error::PoolTimedOut).category(),
            ErrorCategory::Operational
        );
        assert_eq!(
            ApiError::from(sqlx::Error::PoolClosed).category(),
            ErrorCategory::Operational
        );
    }

    #[test]
    fn test_decode_errors_are_invalid_request() {
        let err = ApiError::from(sqlx::Error::ColumnNotFound("label".to_string()));
        assert_eq!(err.category(), ErrorCategory::InvalidRequest);

        let err = ApiError::from(sqlx::Error::Protocol("bad frame".to_string()));
        assert_eq!(err.category(), ErrorCategory::InvalidRequest);
    }

    #[test]
    fn test_jwt_errors_are_unauthorized() {
        assert_eq!(
            ApiError::from(JwtError::Expired).category(),
            ErrorCategory::Unauthorized
        );
        assert_eq!(
            ApiError::from(JwtError::InvalidIssuer).category(),
            ErrorCategory::Unauthorized
        );
    }

    #[test]
    fn test_validation_detail_serializes_type() {
        let detail = ValidationErrorDetail::new(["path", "id"], "bad", "int_parsing");
        let json = serde_json::to_value(detail).unwrap();
        assert_eq!(json["type"], "int_parsing");
        assert_eq!(json["loc"], serde_json::json!(["path", "id"]));
    }
}
