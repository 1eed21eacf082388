/// Category, level and status endpoints
///
/// The three label resources share one set of handlers, instantiated per
/// [`LabelKind`] in the router.
///
/// # Endpoints
///
/// - `POST /{labels}/` - Create a label
/// - `GET /{labels}/` - List all labels
/// - `GET /{labels}/:id` - Get a label
/// - `PUT /{labels}/:id` - Rename a label
/// - `DELETE /{labels}/:id` - Delete a label (refused while a ticket uses it)

use crate::{
    error::{ApiError, ApiResult},
    extract::{PatchRules, ResourceId, Session, ValidatedJson},
    guard::guard,
};
use axum::{http::StatusCode, Json};
use serde::Deserialize;
use tik_shared::{
    models::label::{LabelKind, LabelRecord, Labels},
    patch::Patch,
};
use tracing::info;
use validator::{Validate, ValidationErrors};

/// Create label request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLabelRequest {
    #[validate(length(
        max = 20,
        code = "string_too_long",
        message = "String should have at most 20 characters"
    ))]
    pub label: String,
}

/// Update label request
#[derive(Debug, Deserialize)]
pub struct UpdateLabelRequest {
    #[serde(default)]
    pub label: Patch<String>,
}

impl Validate for UpdateLabelRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        PatchRules::new().max_chars("label", &self.label, 20).finish()
    }
}

fn not_found<K: LabelKind>(id: i64) -> String {
    format!("{} with ID {} not found", K::ENTITY, id)
}

/// Create a label
///
/// ```text
/// POST /categories/
/// { "label": "Bug" }
/// ```
///
/// Responds `201` with `{ "id": 1, "label": "Bug" }`. A duplicate label is
/// rejected by the store with `400`.
pub async fn create<K: LabelKind>(
    Session(session): Session,
    ValidatedJson(req): ValidatedJson<CreateLabelRequest>,
) -> ApiResult<(StatusCode, Json<LabelRecord>)> {
    info!("Attempting to create a new {}", K::ENTITY.to_lowercase());

    let id = {
        let mut conn = session.connection().await?;
        Labels::<K>::create(&mut conn, &req.label).await?
    };
    session.commit().await?;

    let mut conn = session.connection().await?;
    let record = guard(Labels::<K>::find_by_id(&mut conn, id).await?, not_found::<K>(id))?;

    info!(id, "{} created successfully", K::ENTITY);
    Ok((StatusCode::CREATED, Json(record)))
}

/// List all labels in creation order
pub async fn list<K: LabelKind>(Session(session): Session) -> ApiResult<Json<Vec<LabelRecord>>> {
    info!("Attempting to retrieve all {}", K::PLURAL);

    let mut conn = session.connection().await?;
    let records = guard(
        Labels::<K>::list(&mut conn).await?,
        format!("No {} found", K::PLURAL),
    )?;

    info!(count = records.len(), "{} retrieved successfully", K::PLURAL);
    Ok(Json(records))
}

pub async fn get<K: LabelKind>(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<LabelRecord>> {
    info!(id, "Attempting to retrieve {}", K::ENTITY.to_lowercase());

    let mut conn = session.connection().await?;
    let record = guard(Labels::<K>::find_by_id(&mut conn, id).await?, not_found::<K>(id))?;

    info!(id, "{} retrieved successfully", K::ENTITY);
    Ok(Json(record))
}

/// Rename a label
///
/// An empty body returns the label unchanged.
pub async fn update<K: LabelKind>(
    Session(session): Session,
    ResourceId(id): ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateLabelRequest>,
) -> ApiResult<Json<LabelRecord>> {
    info!(id, "Attempting to update {}", K::ENTITY.to_lowercase());

    {
        let mut conn = session.connection().await?;
        let current = guard(Labels::<K>::find_by_id(&mut conn, id).await?, not_found::<K>(id))?;

        let Some(label) = req.label.into_assignment() else {
            info!(id, "No changes supplied for {}", K::ENTITY.to_lowercase());
            return Ok(Json(current));
        };

        if !Labels::<K>::update(&mut conn, id, label).await? {
            return Err(ApiError::stale("UPDATE", K::TABLE));
        }
    }
    session.commit().await?;

    let mut conn = session.connection().await?;
    let record = guard(Labels::<K>::find_by_id(&mut conn, id).await?, not_found::<K>(id))?;

    info!(id, "{} updated successfully", K::ENTITY);
    Ok(Json(record))
}

pub async fn delete<K: LabelKind>(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    info!(id, "Attempting to delete {}", K::ENTITY.to_lowercase());

    {
        let mut conn = session.connection().await?;
        guard(Labels::<K>::find_by_id(&mut conn, id).await?, not_found::<K>(id))?;

        if !Labels::<K>::delete(&mut conn, id).await? {
            return Err(ApiError::stale("DELETE", K::TABLE));
        }
    }
    session.commit().await?;

    info!(id, "{} deleted successfully", K::ENTITY);
    Ok(StatusCode::OK)
}
