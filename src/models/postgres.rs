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
    PgPool, Row,
    postgres::{PgConnectOptions, PgPoolOptions, PgRow},
};
use std::str::FromStr;

// SQL schemas for PostgreSQL models
const SNIPPETS_TABLE: &str = "CREATE TABLE IF NOT EXISTS snippets (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(100) NOT NULL,
        content TEXT NOT NULL,
        created BIGINT NOT NULL,
        expires BIGINT NOT NULL
    )";

const SNIPPETS_CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_snippets_created ON snippets(created)";

const USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        hashed_password TEXT NOT NULL,
        created BIGINT NOT NULL,
        CONSTRAINT users_uc_email UNIQUE (email)
    )";

/// Connect to a Postgres database and create the schema.
#[tracing::instrument(skip_all)]
pub async fn connect(uri: &str) -> Result<PgPool, Box<dyn std::error::Error + Send + Sync>> {
    let opts = PgConnectOptions::from_str(uri)?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    sqlx::query(SNIPPETS_TABLE).execute(&pool).await?;
    sqlx::query(SNIPPETS_CREATED_INDEX).execute(&pool).await?;
    sqlx::query(USERS_TABLE).execute(&pool).await?;

    Ok(pool)
}

fn snippet_from_row(row: &PgRow) -> Result<Snippet, sqlx::Error> {
    Ok(Snippet {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created: timestamp(row.try_get("created")?)?,
        expires: timestamp(row.try_get("expires")?)?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        hashed_password: row.try_get("hashed_password")?,
        created: timestamp(row.try_get("created")?)?,
    })
}

#[derive(Clone)]
pub struct PostgresSnippets {
    pool: PgPool,
}

impl PostgresSnippets {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetModel for PostgresSnippets {
    #[tracing::instrument(skip_all)]
    async fn insert(&self, title: &str, content: &str, expires: i32) -> Result<i64, ModelError> {
        let (created, expires_at) = created_and_expires(expires)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO snippets (title, content, created, expires) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(created)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    #[tracing::instrument(skip_all)]
    async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        let now = chrono::Utc::now().timestamp();
        let row = sqlx::query(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > $1 AND id = $2",
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
             WHERE expires > $1 ORDER BY id DESC LIMIT $2",
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
pub struct PostgresUsers {
    pool: PgPool,
}

impl PostgresUsers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserModel for PostgresUsers {
    #[tracing::instrument(skip_all)]
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError> {
        let hash = hash_password(password).await?;
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO users (name, email, hashed_password, created) VALUES ($1, $2, $3, $4)",
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
        let Some(row) = sqlx::query("SELECT id, name, email, hashed_password, created FROM users WHERE email = $1")
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
        let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}
