/// User model and database operations
///
/// Users own projects, tickets and comments. Deleting a user cascades to
/// everything they created (declared in the schema). Passwords are stored as
/// Argon2id hashes produced by [`crate::auth::password::PasswordHasher`];
/// the hash never leaves this crate in a read-model.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     first_name VARCHAR(50) NOT NULL,
///     last_name VARCHAR(50) NOT NULL,
///     username VARCHAR(50) NOT NULL UNIQUE,
///     email VARCHAR(100) NOT NULL UNIQUE,
///     role VARCHAR(20) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tik_shared::models::user::{CreateUser, User};
/// use sqlx::SqliteConnection;
///
/// # async fn example(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
/// let id = User::create(conn, CreateUser {
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     username: "johndoe".to_string(),
///     email: "johndoe@example.com".to_string(),
///     role: "user".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_username(conn, "johndoe").await?;
/// assert_eq!(found.map(|u| u.id), Some(id));
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::models::comment::{Comment, CommentSummary};
use crate::models::project::{Project, ProjectSummary};
use crate::models::ticket::{Ticket, TicketSummary};
use crate::patch::Patch;

/// User row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,

    /// Unique login name
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Free-form role label ("user", "admin", ...)
    pub role: String,

    /// Argon2id password hash, never plaintext
    pub password_hash: String,
}

/// Input for creating a new user
///
/// The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

/// Input for updating an existing user
///
/// Only set fields are written. `Patch::Null` writes NULL and is rejected by
/// the schema's NOT NULL constraints.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub username: Patch<String>,
    pub email: Patch<String>,
    pub role: Patch<String>,
    pub password_hash: Patch<String>,
}

impl UpdateUser {
    /// True when no field was supplied
    pub fn is_empty(&self) -> bool {
        self.first_name.is_unset()
            && self.last_name.is_unset()
            && self.username.is_unset()
            && self.email.is_unset()
            && self.role.is_unset()
            && self.password_hash.is_unset()
    }
}

/// Light user read-model, embedded in other entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Full user read-model with everything the user created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: UserSummary,
    pub projects: Vec<ProjectSummary>,
    pub tickets: Vec<TicketSummary>,
    pub comments: Vec<CommentSummary>,
}

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, role, password_hash";

impl User {
    /// Creates a new user and returns the generated ID
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username or email already exists (unique constraint violation)
    /// - The password hash is empty (check constraint violation)
    /// - Database connection fails
    pub async fn create(conn: &mut SqliteConnection, data: CreateUser) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, username, email, role, password_hash)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.username)
        .bind(data.email)
        .bind(data.role)
        .bind(data.password_hash)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Finds a user by ID
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Finds a user by login name
    pub async fn find_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Lists one page of users ordered by ID
    pub async fn list_page(
        conn: &mut SqliteConnection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
    }

    /// Counts all users
    pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await
    }

    /// Updates an existing user
    ///
    /// Only set fields in `data` are written.
    ///
    /// # Returns
    ///
    /// True if the row was matched, false if it no longer exists
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username or email collides with another user
    /// - A NOT NULL column is set to null
    /// - Database connection fails
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        data: UpdateUser,
    ) -> Result<bool, sqlx::Error> {
        if data.is_empty() {
            return Ok(Self::find_by_id(conn, id).await?.is_some());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut set = builder.separated(", ");

        if let Some(value) = data.first_name.into_assignment() {
            set.push("first_name = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.last_name.into_assignment() {
            set.push("last_name = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.username.into_assignment() {
            set.push("username = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.email.into_assignment() {
            set.push("email = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.role.into_assignment() {
            set.push("role = ").push_bind_unseparated(value);
        }
        if let Some(value) = data.password_hash.into_assignment() {
            set.push("password_hash = ").push_bind_unseparated(value);
        }

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&mut *conn).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    ///
    /// Cascades to the user's projects, tickets and comments.
    ///
    /// # Returns
    ///
    /// True if the user was deleted, false if it didn't exist
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Strips the password hash
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }

    /// Loads a user's summary by ID, failing with `RowNotFound` if absent
    pub(crate) async fn load_summary(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<UserSummary, sqlx::Error> {
        Self::find_by_id(conn, id)
            .await?
            .map(|user| user.summary())
            .ok_or(sqlx::Error::RowNotFound)
    }
}

impl UserView {
    /// Assembles the full read-model for a user
    pub async fn load(conn: &mut SqliteConnection, user: &User) -> Result<Self, sqlx::Error> {
        let projects = Project::summaries_by_creator(conn, user.id).await?;
        let tickets = Ticket::summaries_by_creator(conn, user.id).await?;
        let comments = Comment::summaries_by_creator(conn, user.id).await?;

        Ok(Self {
            user: user.summary(),
            projects,
            tickets,
            comments,
        })
    }
}
