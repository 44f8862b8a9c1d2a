use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::ModelError;

/// A stored snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// A registered user. The plaintext password is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

#[async_trait]
pub trait SnippetModel: Send + Sync {
    /// Store a snippet expiring `expires` days from now and return its id
    async fn insert(&self, title: &str, content: &str, expires: i32) -> Result<i64, ModelError>;

    /// Retrieve a snippet by id. Expired snippets are reported as `NoRecord`.
    async fn get(&self, id: i64) -> Result<Snippet, ModelError>;

    /// The most recently created non-expired snippets, newest first
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError>;
}

#[async_trait]
pub trait UserModel: Send + Sync {
    /// Register a user, hashing `password` before it is stored.
    /// Returns `DuplicateEmail` when the email is already registered.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError>;

    /// Check credentials and return the user id.
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError>;

    /// Check whether a user with `id` exists
    async fn exists(&self, id: i64) -> Result<bool, ModelError>;
}

pub type DynSnippets = Arc<dyn SnippetModel>;
pub type DynUsers = Arc<dyn UserModel>;

/// Both model handles backed by the same database.
#[derive(Clone)]
pub struct Models {
    pub snippets: DynSnippets,
    pub users: DynUsers,
}

pub mod common;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sqlite;

/// Open the models from a connection URI.
pub async fn open(uri: &str) -> Result<Models, Box<dyn std::error::Error + Send + Sync>> {
    if uri.starts_with("sqlite:") {
        let pool = sqlite::connect(uri).await?;
        Ok(Models {
            snippets: Arc::new(sqlite::SqliteSnippets::new(pool.clone())),
            users: Arc::new(sqlite::SqliteUsers::new(pool)),
        })
    } else if uri.starts_with("postgres:") {
        #[cfg(feature = "postgres")]
        {
            let pool = postgres::connect(uri).await?;
            Ok(Models {
                snippets: Arc::new(postgres::PostgresSnippets::new(pool.clone())),
                users: Arc::new(postgres::PostgresUsers::new(pool)),
            })
        }
        #[cfg(not(feature = "postgres"))]
        {
            Err("postgres backend not enabled".into())
        }
    } else {
        Err("unknown database backend".into())
    }
}
