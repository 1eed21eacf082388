/// Request extractors
///
/// Every decoding failure is reported as `ApiError::Validation` with a `loc`
/// naming where the bad input was (`path`, `query` or `body`), so clients get
/// the same 422 envelope whichever part of the request was wrong.
///
/// - [`Session`]: the request's database session, installed by the session layer
/// - [`ValidatedJson`]: JSON body deserialized with serde and checked with `validator`
/// - [`ResourceId`]: the `:id` path segment as an integer
/// - [`PageParams`]: `page` / `size` query parameters
///
/// Update bodies carry [`Patch`] fields, which the `validator` derive cannot
/// look into; their `Validate` impls use [`PatchRules`] instead.

use crate::error::{ApiError, ValidationErrorDetail};
use crate::pagination::{PageParams, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::borrow::Cow;
use tik_shared::{db::session::DbSession, patch::Patch};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

/// The request-scoped database session
pub struct Session(pub DbSession);

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<DbSession>()
            .cloned()
            .map(Session)
            .ok_or_else(|| ApiError::Operational("Database session unavailable".to_string()))
    }
}

/// JSON body that has passed `Validate`
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

        let value: T = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Validation(vec![json_error_detail(&e)]))?;

        value
            .validate()
            .map_err(|e| ApiError::Validation(validation_details(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// Integer `:id` path parameter
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                ApiError::Validation(vec![ValidationErrorDetail::new(
                    ["path", "id"],
                    "Input should be a valid integer, unable to parse string as an integer",
                    "int_parsing",
                )])
            })?;

        Ok(ResourceId(id))
    }
}

#[derive(Deserialize)]
struct RawPageQuery {
    page: Option<String>,
    size: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for PageParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(vec![ValidationErrorDetail::new(
                    ["query"],
                    rejection.body_text(),
                    "query_invalid",
                )])
            })?;

        let page = parse_bounded(raw.page, "page", DEFAULT_PAGE, 1, None);
        let size = parse_bounded(raw.size, "size", DEFAULT_PAGE_SIZE, 1, Some(MAX_PAGE_SIZE));

        match (page, size) {
            (Ok(page), Ok(size)) if (page - 1).checked_mul(size).is_none() => {
                Err(ApiError::Validation(vec![ValidationErrorDetail::new(
                    ["query", "page"],
                    format!("Input should be less than or equal to {}", i64::MAX / size + 1),
                    "less_than_equal",
                )]))
            }
            (Ok(page), Ok(size)) => Ok(PageParams { page, size }),
            (page, size) => Err(ApiError::Validation(
                [page.err(), size.err()].into_iter().flatten().collect(),
            )),
        }
    }
}

fn parse_bounded(
    raw: Option<String>,
    name: &str,
    default: i64,
    min: i64,
    max: Option<i64>,
) -> Result<i64, ValidationErrorDetail> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    let value = raw.trim().parse::<i64>().map_err(|_| {
        ValidationErrorDetail::new(
            ["query", name],
            "Input should be a valid integer, unable to parse string as an integer",
            "int_parsing",
        )
    })?;

    if value < min {
        return Err(ValidationErrorDetail::new(
            ["query", name],
            format!("Input should be greater than or equal to {}", min),
            "greater_than_equal",
        ));
    }

    match max {
        Some(max) if value > max => Err(ValidationErrorDetail::new(
            ["query", name],
            format!("Input should be less than or equal to {}", max),
            "less_than_equal",
        )),
        _ => Ok(value),
    }
}

/// Describes a body that serde could not decode
fn json_error_detail(err: &serde_json::Error) -> ValidationErrorDetail {
    use serde_json::error::Category;

    let message = err.to_string();

    match err.classify() {
        Category::Data => match missing_field(&message) {
            Some(field) => ValidationErrorDetail::new(["body", field], "Field required", "missing"),
            None => ValidationErrorDetail::new(["body"], message.as_str(), "type_error"),
        },
        Category::Syntax | Category::Eof | Category::Io => {
            ValidationErrorDetail::new(["body"], format!("JSON decode error: {}", message), "json_invalid")
        }
    }
}

/// Field name from serde's "missing field `name`" message
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

/// Flattens `validator` errors into sorted details
pub fn validation_details(errors: &ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                ValidationErrorDetail::new(
                    ["body".to_string(), field.to_string()],
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                    error.code.to_string(),
                )
            })
        })
        .collect();

    details.sort_by(|a, b| a.loc.cmp(&b.loc));
    details
}

/// Field rules for `Patch` values; only `Patch::Value` is checked
pub struct PatchRules {
    errors: ValidationErrors,
}

impl PatchRules {
    pub fn new() -> Self {
        Self {
            errors: ValidationErrors::new(),
        }
    }

    pub fn max_chars(mut self, field: &'static str, value: &Patch<String>, max: usize) -> Self {
        if let Some(value) = value.value() {
            if value.chars().count() > max {
                self.add(
                    field,
                    "string_too_long",
                    format!("String should have at most {} characters", max),
                );
            }
        }
        self
    }

    pub fn min_chars(mut self, field: &'static str, value: &Patch<String>, min: usize) -> Self {
        if let Some(value) = value.value() {
            if value.chars().count() < min {
                self.add(
                    field,
                    "string_too_short",
                    format!("String should have at least {} characters", min),
                );
            }
        }
        self
    }

    pub fn email(mut self, field: &'static str, value: &Patch<String>) -> Self {
        if let Some(value) = value.value() {
            if !value.validate_email() {
                self.add(field, "value_error", "value is not a valid email address".to_string());
            }
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.errors().is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn add(&mut self, field: &'static str, code: &'static str, message: String) {
        let mut error = ValidationError::new(code);
        error.message = Some(Cow::Owned(message));
        self.errors.add(field, error);
    }
}

impl Default for PatchRules {
    fn default() -> Self {
        Self::new()
    }
}
