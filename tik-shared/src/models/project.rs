/// Project model and database operations
///
/// A project groups tickets and belongs to the user who created it.
/// Deleting a project removes its tickets, and with them their comments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     label VARCHAR(100) NOT NULL,
///     description VARCHAR(500) NOT NULL,
///     creator_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     creation_date DATE NOT NULL DEFAULT CURRENT_DATE,
///     update_date DATE
/// );
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::models::ticket::{Ticket, TicketSummary};
use crate::models::user::{User, UserSummary};
use crate::patch::Patch;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub label: String,
    pub description: String,
    pub creator_id: i64,
    pub creation_date: NaiveDate,

    /// None until the first update
    pub update_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub label: String,
    pub description: String,
    pub creator_id: i64,
}

/// Input for updating a project; unset fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub label: Patch<String>,
    pub description: Patch<String>,
    pub creator_id: Patch<i64>,
}

impl UpdateProject {
    pub fn is_empty(&self) -> bool {
        self.label.is_unset() && self.description.is_unset() && self.creator_id.is_unset()
    }
}

/// Light project read-model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub label: String,
    pub description: String,
    pub creation_date: NaiveDate,
    pub update_date: Option<NaiveDate>,
}

/// Full project read-model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: ProjectSummary,
    pub creator: UserSummary,
    pub tickets: Vec<TicketSummary>,
}

const PROJECT_COLUMNS: &str = "id, label, description, creator_id, creation_date, update_date";

impl Project {
    /// Creates a project and returns its generated ID
    ///
    /// # Errors
    ///
    /// Returns a foreign-key database error if the creator does not exist.
    pub async fn create(
        conn: &mut SqliteConnection,
        data: CreateProject,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO projects (label, description, creator_id) VALUES (?, ?, ?)",
        )
        .bind(data.label)
        .bind(data.description)
        .bind(data.creator_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id"
        ))
        .fetch_all(&mut *conn)
        .await
    }

    /// Updates a project and stamps `update_date` with today's date
    ///
    /// # Returns
    ///
    /// True if the row was matched, false if it no longer exists
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        data: UpdateProject,
    ) -> Result<bool, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE projects SET ");
        let mut set = builder.separated(", ");
        set.push("update_date = CURRENT_DATE");

        if let Some(value) = data.label.into_assignment() {
            set.push("label = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.description.into_assignment() {
            set.push("description = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.creator_id.into_assignment() {
            set.push("creator_id = ").push_bind_unseparated(value);
        }

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&mut *conn).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a project and, through the schema, its tickets and comments
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            label: self.label.clone(),
            description: self.description.clone(),
            creation_date: self.creation_date,
            update_date: self.update_date,
        }
    }

    /// Summaries of every project a user created
    pub async fn summaries_by_creator(
        conn: &mut SqliteConnection,
        creator_id: i64,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE creator_id = ? ORDER BY id"
        ))
        .bind(creator_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(projects.iter().map(Project::summary).collect())
    }

    pub(crate) async fn load_summary(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<ProjectSummary, sqlx::Error> {
        Self::find_by_id(conn, id)
            .await?
            .map(|project| project.summary())
            .ok_or(sqlx::Error::RowNotFound)
    }
}

impl ProjectView {
    /// Assembles the full read-model: creator plus ticket summaries
    pub async fn load(conn: &mut SqliteConnection, project: &Project) -> Result<Self, sqlx::Error> {
        let creator = User::load_summary(conn, project.creator_id).await?;
        let tickets = Ticket::summaries_by_project(conn, project.id).await?;

        Ok(Self {
            project: project.summary(),
            creator,
            tickets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_dates() {
        let project = Project {
            id: 1,
            label: "Project Alpha".to_string(),
            description: "First project".to_string(),
            creator_id: 1,
            creation_date: NaiveDate::from_ymd_opt(2024, 10, 14).unwrap(),
            update_date: None,
        };

        let json = serde_json::to_value(project.summary()).unwrap();
        assert_eq!(json["creation_date"], "2024-10-14");
        assert!(json["update_date"].is_null());
        assert!(json.get("creator_id").is_none());
    }

    #[test]
    fn test_update_project_is_empty() {
        assert!(UpdateProject::default().is_empty());
        assert!(!UpdateProject {
            creator_id: Patch::Value(2),
            ..Default::default()
        }
        .is_empty());
    }
}
