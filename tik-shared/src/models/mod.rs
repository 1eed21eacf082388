/// Database models for TiK
///
/// Every operation takes a `&mut SqliteConnection`, normally the connection
/// of the request's [`DbSession`](crate::db::session::DbSession), so that all
/// reads and writes of one request share a transaction.
///
/// # Models
///
/// - `user`: user accounts
/// - `project`: projects owned by a creator
/// - `ticket`: tickets within a project
/// - `comment`: comments on a ticket
/// - `label`: the category, level and status lookup tables
///
/// Each entity has a light `*Summary` read-model used when it is embedded in
/// another entity, and a full `*View` read-model returned by its own routes.
///
/// # Example
///
/// ```no_run
/// use tik_shared::db::session::DbSession;
/// use tik_shared::models::project::{CreateProject, Project, ProjectView};
///
/// # async fn example(session: DbSession, creator_id: i64) -> Result<(), sqlx::Error> {
/// let mut conn = session.connection().await?;
/// let id = Project::create(&mut conn, CreateProject {
///     label: "Project Alpha".to_string(),
///     description: "First project".to_string(),
///     creator_id,
/// }).await?;
///
/// if let Some(project) = Project::find_by_id(&mut conn, id).await? {
///     let view = ProjectView::load(&mut conn, &project).await?;
///     println!("{} by {}", view.project.label, view.creator.username);
/// }
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod label;
pub mod project;
pub mod ticket;
pub mod user;
