use std::{collections::HashMap, io, path::PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use todos_api::v1::{sort_by_created, Todo, TodoId, TodoStatus};
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use super::Store;
use crate::error::StoreError;

type Collection = HashMap<TodoId, Todo>;

/// Todos as documents in one collection keyed by a random UUID.
///
/// With a path, every change is written to a RON file before it becomes
/// visible, so a failed write leaves the collection as it was.
#[derive(Debug)]
pub struct DocumentStore {
    path: Option<PathBuf>,
    todos: Mutex<Collection>,
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            todos: Mutex::new(Collection::new()),
        }
    }

    pub async fn open(path: Option<PathBuf>) -> Result<Self, StoreError> {
        let Some(path) = path else {
            return Ok(Self::in_memory());
        };

        let todos = match fs::read_to_string(&path).await {
            Ok(text) => match ron::from_str(&text)? {
                DataOwned::V1 { todos } => todos,
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Collection::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path = %path.display(), count = todos.len(), "opened document store");

        Ok(Self {
            path: Some(path),
            todos: Mutex::new(todos),
        })
    }

    async fn store(&self, todos: &Collection) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = DataBorrowed::V1 { todos };
        let text = ron::ser::to_string_pretty(&data, Default::default())?;

        let tmp = path.with_extension("ron.tmp");
        fs::write(&tmp, text).await?;
        fs::rename(&tmp, path).await?;

        Ok(())
    }

    /// Applies `change` to the collection. With a file, the change goes to a
    /// copy that is swapped in once it has been stored.
    ///
    /// `change` must not modify the collection before it fails.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Collection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut todos = self.todos.lock().await;

        if self.path.is_none() {
            return change(&mut *todos);
        }

        let mut next = todos.clone();
        let value = change(&mut next)?;
        self.store(&next).await?;
        *todos = next;

        Ok(value)
    }

    async fn select(&self, predicate: impl Fn(&Todo) -> bool) -> Vec<Todo> {
        let todos = self.todos.lock().await;
        let mut selected: Vec<_> = todos.values().filter(|todo| predicate(todo)).cloned().collect();
        sort_by_created(&mut selected);
        selected
    }
}

#[async_trait]
impl Store for DocumentStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.select(|_| true).await)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find(&self, id: &TodoId) -> Result<Todo, StoreError> {
        let todos = self.todos.lock().await;
        todos
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %todo.id.as_str()))]
    async fn save(&self, todo: &mut Todo) -> Result<(), StoreError> {
        if todo.is_new() {
            let inserted = Todo {
                id: TodoId::from(Uuid::new_v4()),
                created: Utc::now(),
                ..todo.clone()
            };

            let stored = inserted.clone();
            self.commit(move |todos| {
                todos.insert(stored.id.clone(), stored);
                Ok(())
            })
            .await?;

            *todo = inserted;
            return Ok(());
        }

        let title = todo.title.clone();
        let status = todo.status;
        let id = todo.id.clone();

        let created = self
            .commit(move |todos| {
                let stored = todos.get_mut(&id).ok_or(StoreError::NotFound(id.clone()))?;
                stored.title = title;
                stored.status = status;
                Ok(stored.created)
            })
            .await?;

        todo.created = created;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        self.commit(|todos| match todos.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.clone())),
        })
        .await
    }

    async fn filter(&self, status: TodoStatus) -> Result<Vec<Todo>, StoreError> {
        Ok(self.select(|todo| todo.status == status).await)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%status))]
    async fn clear(&self, status: TodoStatus) -> Result<u64, StoreError> {
        self.commit(|todos| {
            let before = todos.len();
            todos.retain(|_, todo| todo.status != status);
            Ok((before - todos.len()) as u64)
        })
        .await
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.commit(|todos| {
            todos.clear();
            Ok(())
        })
        .await
    }

    async fn close(&self) {
        let todos = self.todos.lock().await;
        if let Err(err) = self.store(&todos).await {
            tracing::error!("Failed to store todos: {:?}", err);
        }
    }
}

#[derive(Serialize)]
enum DataBorrowed<'a> {
    V1 { todos: &'a Collection },
}

#[derive(Deserialize)]
enum DataOwned {
    V1 { todos: Collection },
}
