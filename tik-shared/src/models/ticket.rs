/// Ticket model and database operations
///
/// A ticket lives in a project and carries a status, a level and a category
/// from the label tables. Read-models embed the three labels in full, so
/// summaries are loaded with a join instead of one query per label.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tickets (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(500) NOT NULL,
///     creator_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     status_id INTEGER NOT NULL REFERENCES statuses(id),
///     category_id INTEGER NOT NULL REFERENCES categories(id),
///     level_id INTEGER NOT NULL REFERENCES levels(id),
///     creation_date DATE NOT NULL DEFAULT CURRENT_DATE,
///     update_date DATE
/// );
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::models::comment::{Comment, CommentSummary};
use crate::models::label::LabelRecord;
use crate::models::project::{Project, ProjectSummary};
use crate::models::user::{User, UserSummary};
use crate::patch::Patch;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub creator_id: i64,
    pub project_id: i64,
    pub status_id: i64,
    pub category_id: i64,
    pub level_id: i64,
    pub creation_date: NaiveDate,
    pub update_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub creator_id: i64,
    pub project_id: i64,
    pub status_id: i64,
    pub category_id: i64,
    pub level_id: i64,
}

/// Input for updating a ticket; unset fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateTicket {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub creator_id: Patch<i64>,
    pub project_id: Patch<i64>,
    pub status_id: Patch<i64>,
    pub category_id: Patch<i64>,
    pub level_id: Patch<i64>,
}

impl UpdateTicket {
    pub fn is_empty(&self) -> bool {
        self.title.is_unset()
            && self.description.is_unset()
            && self.creator_id.is_unset()
            && self.project_id.is_unset()
            && self.status_id.is_unset()
            && self.category_id.is_unset()
            && self.level_id.is_unset()
    }
}

/// Light ticket read-model with its labels resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub creation_date: NaiveDate,
    pub update_date: Option<NaiveDate>,
    pub status: LabelRecord,
    pub level: LabelRecord,
    pub category: LabelRecord,
}

/// Full ticket read-model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: TicketSummary,
    pub creator: UserSummary,
    pub project: ProjectSummary,
    pub comments: Vec<CommentSummary>,
}

#[derive(sqlx::FromRow)]
struct TicketSummaryRow {
    id: i64,
    title: String,
    description: String,
    creation_date: NaiveDate,
    update_date: Option<NaiveDate>,
    status_id: i64,
    status_label: String,
    level_id: i64,
    level_label: String,
    category_id: i64,
    category_label: String,
}

impl From<TicketSummaryRow> for TicketSummary {
    fn from(row: TicketSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            creation_date: row.creation_date,
            update_date: row.update_date,
            status: LabelRecord {
                id: row.status_id,
                label: row.status_label,
            },
            level: LabelRecord {
                id: row.level_id,
                label: row.level_label,
            },
            category: LabelRecord {
                id: row.category_id,
                label: row.category_label,
            },
        }
    }
}

const TICKET_COLUMNS: &str = "id, title, description, creator_id, project_id, status_id, \
                              category_id, level_id, creation_date, update_date";

const SUMMARY_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.creation_date, t.update_date,
           s.id AS status_id, s.label AS status_label,
           l.id AS level_id, l.label AS level_label,
           c.id AS category_id, c.label AS category_label
    FROM tickets t
    JOIN statuses s ON s.id = t.status_id
    JOIN levels l ON l.id = t.level_id
    JOIN categories c ON c.id = t.category_id
"#;

impl Ticket {
    /// Creates a ticket and returns its generated ID
    ///
    /// # Errors
    ///
    /// Returns a foreign-key database error if the creator, project, status,
    /// category or level does not exist.
    pub async fn create(conn: &mut SqliteConnection, data: CreateTicket) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO tickets (title, description, creator_id, project_id,
                                 status_id, category_id, level_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.creator_id)
        .bind(data.project_id)
        .bind(data.status_id)
        .bind(data.category_id)
        .bind(data.level_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(&format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY id"))
            .fetch_all(&mut *conn)
            .await
    }

    /// Updates a ticket and stamps `update_date` with today's date
    ///
    /// # Returns
    ///
    /// True if the row was matched, false if it no longer exists
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        data: UpdateTicket,
    ) -> Result<bool, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tickets SET ");
        let mut set = builder.separated(", ");
        set.push("update_date = CURRENT_DATE");

        if let Some(value) = data.title.into_assignment() {
            set.push("title = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.description.into_assignment() {
            set.push("description = ").push_bind_unseparated(value);
        }

        for (column, patch) in [
            ("creator_id", data.creator_id),
            ("project_id", data.project_id),
            ("status_id", data.status_id),
            ("category_id", data.category_id),
            ("level_id", data.level_id),
        ] {
            if let Some(value) = patch.into_assignment() {
                set.push(column).push_unseparated(" = ").push_bind_unseparated(value);
            }
        }

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&mut *conn).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a ticket and, through the schema, its comments
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Loads one ticket summary with labels resolved
    pub async fn load_summary(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<TicketSummary, sqlx::Error> {
        let row = sqlx::query_as::<_, TicketSummaryRow>(&format!("{SUMMARY_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(row.into())
    }

    pub async fn summaries_by_project(
        conn: &mut SqliteConnection,
        project_id: i64,
    ) -> Result<Vec<TicketSummary>, sqlx::Error> {
        Self::summaries_where(conn, "t.project_id", project_id).await
    }

    pub async fn summaries_by_creator(
        conn: &mut SqliteConnection,
        creator_id: i64,
    ) -> Result<Vec<TicketSummary>, sqlx::Error> {
        Self::summaries_where(conn, "t.creator_id", creator_id).await
    }

    async fn summaries_where(
        conn: &mut SqliteConnection,
        column: &str,
        value: i64,
    ) -> Result<Vec<TicketSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TicketSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE {column} = ? ORDER BY t.id"
        ))
        .bind(value)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(TicketSummary::from).collect())
    }
}

impl TicketView {
    /// Assembles the full read-model: labels, creator, project and comments
    pub async fn load(conn: &mut SqliteConnection, ticket: &Ticket) -> Result<Self, sqlx::Error> {
        let summary = Ticket::load_summary(conn, ticket.id).await?;
        let creator = User::load_summary(conn, ticket.creator_id).await?;
        let project = Project::load_summary(conn, ticket.project_id).await?;
        let comments = Comment::summaries_by_ticket(conn, ticket.id).await?;

        Ok(Self {
            ticket: summary,
            creator,
            project,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_row_resolves_labels() {
        let row = TicketSummaryRow {
            id: 3,
            title: "Login fails".to_string(),
            description: "Error 500 on submit".to_string(),
            creation_date: NaiveDate::from_ymd_opt(2024, 10, 14).unwrap(),
            update_date: None,
            status_id: 1,
            status_label: "Open".to_string(),
            level_id: 2,
            level_label: "High".to_string(),
            category_id: 4,
            category_label: "Bug".to_string(),
        };

        let summary = TicketSummary::from(row);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"]["label"], "Open");
        assert_eq!(json["level"]["id"], 2);
        assert_eq!(json["category"]["label"], "Bug");
        assert!(json.get("status_id").is_none());
    }

    #[test]
    fn test_update_ticket_is_empty() {
        assert!(UpdateTicket::default().is_empty());
        assert!(!UpdateTicket {
            level_id: Patch::Null,
            ..Default::default()
        }
        .is_empty());
    }
}
