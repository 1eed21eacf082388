/// Comment model and database operations
///
/// Comments belong to a ticket and a creator, and disappear with either.
/// The comment listing is paginated, so this module also exposes
/// `list_page`/`count` alongside the usual CRUD operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::models::ticket::{Ticket, TicketSummary};
use crate::models::user::{User, UserSummary};
use crate::patch::Patch;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub creator_id: i64,
    pub ticket_id: i64,
    pub creation_date: NaiveDate,
    pub update_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub content: String,
    pub creator_id: i64,
    pub ticket_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateComment {
    pub content: Patch<String>,
    pub creator_id: Patch<i64>,
    pub ticket_id: Patch<i64>,
}

impl UpdateComment {
    pub fn is_empty(&self) -> bool {
        self.content.is_unset() && self.creator_id.is_unset() && self.ticket_id.is_unset()
    }
}

/// Light comment read-model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub id: i64,
    pub content: String,
    pub creation_date: NaiveDate,
    pub update_date: Option<NaiveDate>,
}

/// Full comment read-model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: CommentSummary,
    pub creator: UserSummary,
    pub ticket: TicketSummary,
}

const COMMENT_COLUMNS: &str = "id, content, creator_id, ticket_id, creation_date, update_date";

impl Comment {
    /// Creates a comment and returns its generated ID
    ///
    /// # Errors
    ///
    /// Returns a foreign-key database error if the creator or ticket does not exist.
    pub async fn create(conn: &mut SqliteConnection, data: CreateComment) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO comments (content, creator_id, ticket_id) VALUES (?, ?, ?)")
                .bind(data.content)
                .bind(data.creator_id)
                .bind(data.ticket_id)
                .execute(&mut *conn)
                .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Lists one page of comments ordered by ID
    pub async fn list_page(
        conn: &mut SqliteConnection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
    }

    pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&mut *conn)
            .await
    }

    /// Updates a comment and stamps `update_date` with today's date
    ///
    /// # Returns
    ///
    /// True if the row was matched, false if it no longer exists
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        data: UpdateComment,
    ) -> Result<bool, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE comments SET ");
        let mut set = builder.separated(", ");
        set.push("update_date = CURRENT_DATE");

        if let Some(value) = data.content.into_assignment() {
            set.push("content = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.creator_id.into_assignment() {
            set.push("creator_id = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.ticket_id.into_assignment() {
            set.push("ticket_id = ").push_bind_unseparated(value);
        }

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&mut *conn).await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn summary(&self) -> CommentSummary {
        CommentSummary {
            id: self.id,
            content: self.content.clone(),
            creation_date: self.creation_date,
            update_date: self.update_date,
        }
    }

    pub async fn summaries_by_ticket(
        conn: &mut SqliteConnection,
        ticket_id: i64,
    ) -> Result<Vec<CommentSummary>, sqlx::Error> {
        Self::summaries_where(conn, "ticket_id", ticket_id).await
    }

    pub async fn summaries_by_creator(
        conn: &mut SqliteConnection,
        creator_id: i64,
    ) -> Result<Vec<CommentSummary>, sqlx::Error> {
        Self::summaries_where(conn, "creator_id", creator_id).await
    }

    async fn summaries_where(
        conn: &mut SqliteConnection,
        column: &str,
        value: i64,
    ) -> Result<Vec<CommentSummary>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE {column} = ? ORDER BY id"
        ))
        .bind(value)
        .fetch_all(&mut *conn)
        .await?;

        Ok(comments.iter().map(Comment::summary).collect())
    }
}

impl CommentView {
    /// Assembles the full read-model: creator and ticket summary
    pub async fn load(conn: &mut SqliteConnection, comment: &Comment) -> Result<Self, sqlx::Error> {
        let creator = User::load_summary(conn, comment.creator_id).await?;
        let ticket = Ticket::load_summary(conn, comment.ticket_id).await?;

        Ok(Self {
            comment: comment.summary(),
            creator,
            ticket,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_comment_is_empty() {
        assert!(UpdateComment::default().is_empty());
        assert!(!UpdateComment {
            content: Patch::Value("Edited".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
