/// Ticket endpoints
///
/// # Endpoints
///
/// - `POST /tickets/` - Create a ticket
/// - `GET /tickets/` - List all tickets
/// - `GET /tickets/:id` - Get a ticket with labels, creator, project and comments
/// - `PUT /tickets/:id` - Partially update a ticket
/// - `DELETE /tickets/:id` - Delete a ticket and, by cascade, its comments
///
/// All five references (creator, project, status, category, level) are
/// required on creation and checked by the store's foreign keys.

use crate::{
    error::{ApiError, ApiResult},
    extract::{PatchRules, ResourceId, Session, ValidatedJson},
    guard::guard,
};
use axum::{http::StatusCode, Json};
use serde::Deserialize;
use tik_shared::{
    models::ticket::{CreateTicket, Ticket, TicketView, UpdateTicket},
    patch::Patch,
};
use tracing::info;
use validator::{Validate, ValidationErrors};

/// Create ticket request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(
        max = 100,
        code = "string_too_long",
        message = "String should have at most 100 characters"
    ))]
    pub title: String,

    #[validate(length(
        max = 500,
        code = "string_too_long",
        message = "String should have at most 500 characters"
    ))]
    pub description: String,

    pub creator_id: i64,
    pub project_id: i64,
    pub status_id: i64,
    pub category_id: i64,
    pub level_id: i64,
}

/// Update ticket request
#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub creator_id: Patch<i64>,
    #[serde(default)]
    pub project_id: Patch<i64>,
    #[serde(default)]
    pub status_id: Patch<i64>,
    #[serde(default)]
    pub category_id: Patch<i64>,
    #[serde(default)]
    pub level_id: Patch<i64>,
}

impl Validate for UpdateTicketRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        PatchRules::new()
            .max_chars("title", &self.title, 100)
            .max_chars("description", &self.description, 500)
            .finish()
    }
}

fn not_found(id: i64) -> String {
    format!("Ticket with ID {} not found", id)
}

/// Create a ticket
///
/// ```text
/// POST /tickets/
/// {
///   "title": "Login fails",
///   "description": "500 on submit",
///   "creator_id": 1,
///   "project_id": 1,
///   "status_id": 1,
///   "category_id": 1,
///   "level_id": 1
/// }
/// ```
pub async fn create(
    Session(session): Session,
    ValidatedJson(req): ValidatedJson<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<TicketView>)> {
    info!(title = %req.title, "Attempting to create a new ticket");

    let id = {
        let mut conn = session.connection().await?;
        Ticket::create(
            &mut conn,
            CreateTicket {
                title: req.title,
                description: req.description,
                creator_id: req.creator_id,
                project_id: req.project_id,
                status_id: req.status_id,
                category_id: req.category_id,
                level_id: req.level_id,
            },
        )
        .await?
    };
    session.commit().await?;

    let mut conn = session.connection().await?;
    let ticket = guard(Ticket::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = TicketView::load(&mut conn, &ticket).await?;

    info!(id, "Ticket created successfully");
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list(Session(session): Session) -> ApiResult<Json<Vec<TicketView>>> {
    info!("Attempting to retrieve all tickets");

    let mut conn = session.connection().await?;
    let tickets = guard(Ticket::list(&mut conn).await?, "No tickets found")?;

    let mut views = Vec::with_capacity(tickets.len());
    for ticket in &tickets {
        views.push(TicketView::load(&mut conn, ticket).await?);
    }

    info!(count = views.len(), "Tickets retrieved successfully");
    Ok(Json(views))
}

pub async fn get(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<TicketView>> {
    info!(id, "Attempting to retrieve ticket");

    let mut conn = session.connection().await?;
    let ticket = guard(Ticket::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = TicketView::load(&mut conn, &ticket).await?;

    info!(id, "Ticket retrieved successfully");
    Ok(Json(view))
}

/// Partially update a ticket
///
/// Re-pointing a reference at a row that does not exist fails with `400`.
pub async fn update(
    Session(session): Session,
    ResourceId(id): ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateTicketRequest>,
) -> ApiResult<Json<TicketView>> {
    info!(id, "Attempting to update ticket");

    let changes = UpdateTicket {
        title: req.title,
        description: req.description,
        creator_id: req.creator_id,
        project_id: req.project_id,
        status_id: req.status_id,
        category_id: req.category_id,
        level_id: req.level_id,
    };

    {
        let mut conn = session.connection().await?;
        let ticket = guard(Ticket::find_by_id(&mut conn, id).await?, not_found(id))?;

        if changes.is_empty() {
            info!(id, "No changes supplied for ticket");
            return Ok(Json(TicketView::load(&mut conn, &ticket).await?));
        }

        if !Ticket::update(&mut conn, id, changes).await? {
            return Err(ApiError::stale("UPDATE", "tickets"));
        }
    }
    session.commit().await?;

    let mut conn = session.connection().await?;
    let ticket = guard(Ticket::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = TicketView::load(&mut conn, &ticket).await?;

    info!(id, "Ticket updated successfully");
    Ok(Json(view))
}

pub async fn delete(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    info!(id, "Attempting to delete ticket");

    {
        let mut conn = session.connection().await?;
        guard(Ticket::find_by_id(&mut conn, id).await?, not_found(id))?;

        if !Ticket::delete(&mut conn, id).await? {
            return Err(ApiError::stale("DELETE", "tickets"));
        }
    }
    session.commit().await?;

    info!(id, "Ticket deleted successfully");
    Ok(StatusCode::OK)
}
