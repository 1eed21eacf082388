/// Label lookup tables: categories, levels and statuses
///
/// The three tables share one shape (`id`, unique `label`) and one set of
/// operations, so they are implemented once over a [`LabelKind`] marker.
/// Uniqueness of `label` is enforced by the schema; a duplicate insert
/// surfaces as a unique-constraint database error.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     label VARCHAR(20) NOT NULL UNIQUE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tik_shared::models::label::{Category, Labels};
/// use sqlx::SqliteConnection;
///
/// # async fn example(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
/// let id = Labels::<Category>::create(conn, "Bug").await?;
/// let category = Labels::<Category>::find_by_id(conn, id).await?;
/// assert_eq!(category.map(|c| c.label), Some("Bug".to_string()));
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::marker::PhantomData;

/// Describes one label table
pub trait LabelKind: Send + Sync + 'static {
    /// Table name
    const TABLE: &'static str;

    /// Singular entity name used in messages ("Category")
    const ENTITY: &'static str;

    /// Plural used in messages ("categories")
    const PLURAL: &'static str;
}

/// Ticket categories (Bug, Feature, ...)
pub enum Category {}

/// Ticket priority levels (Low, High, ...)
pub enum Level {}

/// Ticket workflow statuses (Open, Closed, ...)
pub enum Status {}

impl LabelKind for Category {
    const TABLE: &'static str = "categories";
    const ENTITY: &'static str = "Category";
    const PLURAL: &'static str = "categories";
}

impl LabelKind for Level {
    const TABLE: &'static str = "levels";
    const ENTITY: &'static str = "Level";
    const PLURAL: &'static str = "levels";
}

impl LabelKind for Status {
    const TABLE: &'static str = "statuses";
    const ENTITY: &'static str = "Status";
    const PLURAL: &'static str = "statuses";
}

/// A row of any label table; also its read-model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LabelRecord {
    pub id: i64,
    pub label: String,
}

/// Persistence operations for the label table described by `K`
pub struct Labels<K: LabelKind>(PhantomData<K>);

impl<K: LabelKind> Labels<K> {
    /// Inserts a label and returns its generated ID
    ///
    /// # Errors
    ///
    /// Returns a unique-violation database error if the label already exists.
    pub async fn create(conn: &mut SqliteConnection, label: &str) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(&format!("INSERT INTO {} (label) VALUES (?)", K::TABLE))
            .bind(label)
            .execute(&mut *conn)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<LabelRecord>, sqlx::Error> {
        sqlx::query_as::<_, LabelRecord>(&format!(
            "SELECT id, label FROM {} WHERE id = ?",
            K::TABLE
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Lists every label in creation order
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<LabelRecord>, sqlx::Error> {
        sqlx::query_as::<_, LabelRecord>(&format!(
            "SELECT id, label FROM {} ORDER BY id",
            K::TABLE
        ))
        .fetch_all(&mut *conn)
        .await
    }

    /// Sets the label of an existing row
    ///
    /// `None` writes NULL, which the schema rejects with a not-null violation.
    ///
    /// # Returns
    ///
    /// True if a row was updated, false if the row no longer exists
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        label: Option<String>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!("UPDATE {} SET label = ? WHERE id = ?", K::TABLE))
            .bind(label)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a label by ID
    ///
    /// # Errors
    ///
    /// Returns a foreign-key database error while a ticket still references it.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", K::TABLE))
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
