/// Comment endpoints
///
/// # Endpoints
///
/// - `POST /comments/` - Create a comment
/// - `GET /comments/?page=1&size=50` - List comments (paginated)
/// - `GET /comments/:id` - Get a comment with its creator and ticket
/// - `PUT /comments/:id` - Partially update a comment
/// - `DELETE /comments/:id` - Delete a comment

use crate::{
    error::{ApiError, ApiResult},
    extract::{PatchRules, ResourceId, Session, ValidatedJson},
    guard::guard,
    pagination::{Page, PageParams},
};
use axum::{http::StatusCode, Json};
use serde::Deserialize;
use tik_shared::{
    models::comment::{Comment, CommentView, CreateComment, UpdateComment},
    patch::Patch,
};
use tracing::info;
use validator::{Validate, ValidationErrors};

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        max = 500,
        code = "string_too_long",
        message = "String should have at most 500 characters"
    ))]
    pub content: String,

    pub creator_id: i64,
    pub ticket_id: i64,
}

/// Update comment request
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub content: Patch<String>,
    #[serde(default)]
    pub creator_id: Patch<i64>,
    #[serde(default)]
    pub ticket_id: Patch<i64>,
}

impl Validate for UpdateCommentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        PatchRules::new()
            .max_chars("content", &self.content, 500)
            .finish()
    }
}

fn not_found(id: i64) -> String {
    format!("Comment with ID {} not found", id)
}

pub async fn create(
    Session(session): Session,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    info!(ticket_id = req.ticket_id, "Attempting to create a new comment");

    let id = {
        let mut conn = session.connection().await?;
        Comment::create(
            &mut conn,
            CreateComment {
                content: req.content,
                creator_id: req.creator_id,
                ticket_id: req.ticket_id,
            },
        )
        .await?
    };
    session.commit().await?;

    let mut conn = session.connection().await?;
    let comment = guard(Comment::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = CommentView::load(&mut conn, &comment).await?;

    info!(id, "Comment created successfully");
    Ok((StatusCode::CREATED, Json(view)))
}

/// List comments, one page at a time
pub async fn list(
    Session(session): Session,
    params: PageParams,
) -> ApiResult<Json<Page<CommentView>>> {
    info!(page = params.page, size = params.size, "Attempting to retrieve comments");

    let mut conn = session.connection().await?;
    let total = Comment::count(&mut conn).await?;
    let comments = guard(
        Comment::list_page(&mut conn, params.limit(), params.offset()).await?,
        "No comments found",
    )?;

    let mut items = Vec::with_capacity(comments.len());
    for comment in &comments {
        items.push(CommentView::load(&mut conn, comment).await?);
    }

    info!(count = items.len(), total, "Comments retrieved successfully");
    Ok(Json(Page::new(items, total, params, "/comments/")))
}

pub async fn get(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<CommentView>> {
    info!(id, "Attempting to retrieve comment");

    let mut conn = session.connection().await?;
    let comment = guard(Comment::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = CommentView::load(&mut conn, &comment).await?;

    info!(id, "Comment retrieved successfully");
    Ok(Json(view))
}

pub async fn update(
    Session(session): Session,
    ResourceId(id): ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateCommentRequest>,
) -> ApiResult<Json<CommentView>> {
    info!(id, "Attempting to update comment");

    let changes = UpdateComment {
        content: req.content,
        creator_id: req.creator_id,
        ticket_id: req.ticket_id,
    };

    {
        let mut conn = session.connection().await?;
        let comment = guard(Comment::find_by_id(&mut conn, id).await?, not_found(id))?;

        if changes.is_empty() {
            info!(id, "No changes supplied for comment");
            return Ok(Json(CommentView::load(&mut conn, &comment).await?));
        }

        if !Comment::update(&mut conn, id, changes).await? {
            return Err(ApiError::stale("UPDATE", "comments"));
        }
    }
    session.commit().await?;

    let mut conn = session.connection().await?;
    let comment = guard(Comment::find_by_id(&mut conn, id).await?, not_found(id))?;
    let view = CommentView::load(&mut conn, &comment).await?;

    info!(id, "Comment updated successfully");
    Ok(Json(view))
}

pub async fn delete(
    Session(session): Session,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    info!(id, "Attempting to delete comment");

    {
        let mut conn = session.connection().await?;
        guard(Comment::find_by_id(&mut conn, id).await?, not_found(id))?;

        if !Comment::delete(&mut conn, id).await? {
            return Err(ApiError::stale("DELETE", "comments"));
        }
    }
    session.commit().await?;

    info!(id, "Comment deleted successfully");
    Ok(StatusCode::OK)
}
