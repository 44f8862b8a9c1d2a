use super::{
    Snippet, SnippetModel, User, UserModel,
    common::{
        LATEST_LIMIT, created_and_expires, hash_password, is_unique_violation, timestamp,
        verify_password,
    },
};
use crate::error::ModelError;
use async_trait::async_trait;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use std::str::FromStr;

// SQL schemas for SQLite models
const SNIPPETS_TABLE: &str = "CREATE TABLE IF NOT EXISTS snippets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created INTEGER NOT NULL,
        expires INTEGER NOT NULL
    )";

const SNIPPETS_CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_snippets_created ON snippets(created)";

const USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        hashed_password TEXT NOT NULL,
        created INTEGER NOT NULL,
        CONSTRAINT users_uc_email UNIQUE (email)
    )";

/// Connect to a SQLite database and create the schema.
///
/// # Errors
///
/// Returns an error if the URI is invalid, the connection fails or schema
/// creation fails.
#[tracing::instrument(skip_all)]
pub async fn connect(uri: &str) -> Result<SqlitePool, Box<dyn std::error::Error + Send + Sync>> {
    let options = SqliteConnectOptions::from_str(uri)
        .map_err(|e| {
            format!(
                "Invalid SQLite database URI '{}': {}

Please ensure the URI is in the correct format:
- File database: sqlite:///path/to/snippetbox.db
- In-memory database: sqlite::memory:
- Relative path: sqlite://relative/path.db",
                uri, e
            )
        })?
        .create_if_missing(true);

    // Every connection to `:memory:` is a separate database.
    let max_connections = if uri.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| {
            format!(
                "Failed to connect to SQLite database '{}': {}

Possible causes:
- Parent directory does not exist and cannot be created
- Permission denied accessing the database file or directory
- Database file is corrupted or not a valid SQLite database
- Database is locked by another process",
                uri, e
            )
        })?;

    sqlx::query(SNIPPETS_TABLE).execute(&pool).await?;
    sqlx::query(SNIPPETS_CREATED_INDEX).execute(&pool).await?;
    sqlx::query(USERS_TABLE).execute(&pool).await?;

    Ok(pool)
}

fn snippet_from_row(row: &SqliteRow) -> Result<Snippet, sqlx::Error> {
    Ok(Snippet {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created: timestamp(row.try_get("created")?)?,
        expires: timestamp(row.try_get("expires")?)?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        hashed_password: row.try_get("hashed_password")?,
        created: timestamp(row.try_get("created")?)?,
    })
}

#[derive(Clone)]
pub struct SqliteSnippets {
    pool: SqlitePool,
}

impl SqliteSnippets {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetModel for SqliteSnippets {
    #[tracing::instrument(skip_all)]
    async fn insert(&self, title: &str, content: &str, expires: i32) -> Result<i64, ModelError> {
        let (created, expires_at) = created_and_expires(expires)?;
        let result = sqlx::query(
            "INSERT INTO snippets (title, content, created, expires) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(created)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    #[tracing::instrument(skip_all)]
    async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        let now = chrono::Utc::now().timestamp();
        let row = sqlx::query(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > ? AND id = ?",
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ModelError::NoRecord)?;
        Ok(snippet_from_row(&row)?)
    }

    #[tracing::instrument(skip_all)]
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError> {
        let now = chrono::Utc::now().timestamp();
        let rows = sqlx::query(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > ? ORDER BY id DESC LIMIT ?",
        )
        .bind(now)
        .bind(LATEST_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(snippet_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[derive(Clone)]
pub struct SqliteUsers {
    pool: SqlitePool,
}

impl SqliteUsers {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserModel for SqliteUsers {
    #[tracing::instrument(skip_all)]
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError> {
        let hash = hash_password(password).await?;
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO users (name, email, hashed_password, created) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ModelError::DuplicateEmail
            } else {
                ModelError::Database(e)
            }
        })?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        let Some(row) = sqlx::query("SELECT id, name, email, hashed_password, created FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Err(ModelError::InvalidCredentials);
        };
        let user = user_from_row(&row)?;
        if verify_password(password, user.hashed_password).await? {
            Ok(user.id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }

    #[tracing::instrument(skip_all)]
    async fn exists(&self, id: i64) -> Result<bool, ModelError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found != 0)
    }
}
