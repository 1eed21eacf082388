/// Project endpoints
///
/// # Endpoints
///
/// - `POST /projects/` - Create a project
/// - `GET /projects/` - List all projects
/// - `GET /projects/:id` - Get a project with its creator and tickets
/// - `PUT /projects/:id` - Partially update a project
/// - `DELETE /projects/:id` - Delete a project and, by cascade, its tickets

use crate::{
    error::{ApiError, ApiResult},
    extract::{PatchRules, ResourceId, Session, ValidatedJson},
    guard::guard,
};
use axum::{http::StatusCode, Json};
use serde::Deserialize;
use tik_shared::{
    models::project::{CreateProject, Project, ProjectView, UpdateProject},
    patch::Patch,
};
use tracing::info;
use validator::{Validate, ValidationErrors};

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(
        max = 100,
        code = "string_too_long",
        message = "String should have at most 100 characters"
    ))]
    pub label: String,

    #[validate(length(
        max = 500,
        code = "string_too_long",
        message = "String should have at most 500 characters"
    ))]
    pub description: String,

    pub creator_id: i64,
}

/// Update project request
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub label: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub creator_id: Patch<i64>,
}

impl Validate for UpdateProjectRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        PatchRules::new()
            .max_chars("label", &self.label, 100)
            .max_chars("description", &self.description, 500)
            .finish()
    }
}

fn not_found(id: i64) -> String {
    format!("Project with ID {} not found", id)
}

/// Create a project
///
/// `creation_date` is stamped by the store. An unknown `creator_id` is a
/// foreign-key violation (`400`).
pub async fn create(
    Session(session): Session,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    info!(label = %req.label, "Attempting to create a new project");

    let id = {
        let mut conn = session.connection().await?;
        Project::create(
            &mut conn,
            CreateProject {
                label: req.label,
                description: req.description,
                creator_id: req.creator_id,
            },
        )
        .await?
    };
    session.commit().await?;

    let mut conn = session.connection().await?;
    let project = guard(Project::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = ProjectView::load(&mut conn, &project).await?;

    info!(id, "Project created successfully");
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list(Session(session): Session) -> ApiResult<Json<Vec<ProjectView>>> {
    info!("Attempting to retrieve all projects");

    let mut conn = session.connection().await?;
    let projects = guard(Project::list(&mut conn).await?, "No projects found")?;

    let mut views = Vec::with_capacity(projects.len());
    for project in &projects {
        views.push(ProjectView::load(&mut conn, project).await?);
    }

    info!(count = views.len(), "Projects retrieved successfully");
    Ok(Json(views))
}

pub async fn get(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<ProjectView>> {
    info!(id, "Attempting to retrieve project");

    let mut conn = session.connection().await?;
    let project = guard(Project::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = ProjectView::load(&mut conn, &project).await?;

    info!(id, "Project retrieved successfully");
    Ok(Json(view))
}

/// Partially update a project
///
/// Any change stamps `update_date`; an empty body returns the project
/// unchanged.
pub async fn update(
    Session(session): Session,
    ResourceId(id): ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectView>> {
    info!(id, "Attempting to update project");

    let changes = UpdateProject {
        label: req.label,
        description: req.description,
        creator_id: req.creator_id,
    };

    {
        let mut conn = session.connection().await?;
        let project = guard(Project::find_by_id(&mut conn, id).await?, not_found(id))?;

        if changes.is_empty() {
            info!(id, "No changes supplied for project");
            return Ok(Json(ProjectView::load(&mut conn, &project).await?));
        }

        if !Project::update(&mut conn, id, changes).await? {
            return Err(ApiError::stale("UPDATE", "projects"));
        }
    }
    session.commit().await?;

    let mut conn = session.connection().await?;
    let project = guard(Project::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = ProjectView::load(&mut conn, &project).await?;

    info!(id, "Project updated successfully");
    Ok(Json(view))
}

pub async fn delete(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    info!(id, "Attempting to delete project");

    {
        let mut conn = session.connection().await?;
        guard(Project::find_by_id(&mut conn, id).await?, not_found(id))?;

        if !Project::delete(&mut conn, id).await? {
            return Err(ApiError::stale("DELETE", "projects"));
        }
    }
    session.commit().await?;

    info!(id, "Project deleted successfully");
    Ok(StatusCode::OK)
}
