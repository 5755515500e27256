//! Todo storage.
//!
//! [`Store`] is the contract every backend satisfies. Two variants exist:
//! [`SqlStore`] keeps todos in a SQLite table, [`DocumentStore`] keeps them
//! as documents in a single collection. Which one a process uses is decided
//! once, from the database url handed to [`open`].

mod document;
mod sql;

use std::path::PathBuf;

use async_trait::async_trait;
use todos_api::v1::{Todo, TodoId, TodoStatus};

pub use document::DocumentStore;
pub use sql::SqlStore;

use crate::error::StoreError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[async_trait]
pub trait Store: Send + Sync {
    /// Every todo, newest first.
    async fn list(&self) -> Result<Vec<Todo>, StoreError>;

    async fn find(&self, id: &TodoId) -> Result<Todo, StoreError>;

    /// Inserts a todo without an id, updates one with an id.
    ///
    /// An insert fills in `id` and `created`. An update only writes `title`
    /// and `status`, fails with [`StoreError::NotFound`] when nothing has
    /// that id, and reloads `created` from storage.
    async fn save(&self, todo: &mut Todo) -> Result<(), StoreError>;

    async fn delete(&self, id: &TodoId) -> Result<(), StoreError>;

    /// Todos with the given status, newest first.
    async fn filter(&self, status: TodoStatus) -> Result<Vec<Todo>, StoreError>;

    /// Deletes every todo with the given status and returns how many went.
    async fn clear(&self, status: TodoStatus) -> Result<u64, StoreError>;

    /// Drops and recreates the schema.
    async fn reset(&self) -> Result<(), StoreError>;

    async fn close(&self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    Sql(String),
    Document(Option<PathBuf>),
}

impl Backend {
    /// | url                      | backend                    |
    /// |--------------------------|----------------------------|
    /// | `sqlite::memory:`        | sql, in memory             |
    /// | `sqlite://todo.db`       | sql, file                  |
    /// | `memory://`              | document, in memory        |
    /// | `ron://todo.ron`         | document, file             |
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();

        if url.starts_with("sqlite:") {
            return Ok(Backend::Sql(url.to_string()));
        }

        if url == "memory:" || url == "memory://" {
            return Ok(Backend::Document(None));
        }

        match url.strip_prefix("ron://") {
            Some(path) if !path.is_empty() => Ok(Backend::Document(Some(PathBuf::from(path)))),
            _ => Err(StoreError::UnsupportedUrl(url.to_string())),
        }
    }
}

/// Connects to the store named by `url` and makes sure its schema exists.
pub async fn open(url: &str) -> Result<Box<dyn Store>, StoreError> {
    let store: Box<dyn Store> = match Backend::from_url(url)? {
        Backend::Sql(url) => Box::new(SqlStore::open(&url).await?),
        Backend::Document(path) => Box::new(DocumentStore::open(path).await?),
    };

    Ok(store)
}
