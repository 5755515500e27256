use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqliteConnection, SqlitePool,
};
use todos_api::v1::{Todo, TodoId, TodoStatus};

use super::Store;
use crate::error::StoreError;

const DROP_TABLE: [&str; 2] = [
    "DROP INDEX IF EXISTS todo_status",
    "DROP TABLE IF EXISTS todo",
];

const CREATE_TABLE: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS todo (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        title   TEXT NOT NULL,
        status  TEXT NOT NULL,
        created DATETIME NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS todo_status ON todo (status)",
];

async fn execute_all(
    conn: &mut SqliteConnection,
    statements: &[&'static str],
) -> Result<(), StoreError> {
    for &statement in statements {
        sqlx::query(statement).execute(&mut *conn).await?;
    }

    Ok(())
}

#[derive(FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    status: String,
    created: DateTime<Utc>,
}

impl TodoRow {
    fn into_todo(self) -> Result<Todo, StoreError> {
        let status = TodoStatus::from_str(&self.status)
            .map_err(|err| StoreError::Corrupt(format!("todo {}: {err}", self.id)))?;

        Ok(Todo {
            id: TodoId::from(self.id),
            title: self.title,
            status,
            created: self.created,
        })
    }
}

/// Ids handed out by this store are integers in decimal form; anything
/// else, `007` included, names no row.
fn row_key(id: &TodoId) -> Option<i64> {
    let key: i64 = id.as_str().parse().ok()?;
    (key.to_string() == id.as_str()).then_some(key)
}

/// Todos in a SQLite table. Every write runs in its own transaction.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // an in-memory database lives only as long as its connection
        let pool = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let mut tx = pool.begin().await?;
        execute_all(&mut tx, &CREATE_TABLE).await?;
        tx.commit().await?;

        tracing::debug!(url, "opened sql store");

        Ok(Self { pool })
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, todo: &mut Todo) -> Result<(), StoreError> {
        let created = Utc::now();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("INSERT INTO todo (title, status, created) VALUES (?, ?, ?)")
            .bind(todo.title.as_str())
            .bind(todo.status.as_str())
            .bind(created)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        todo.id = TodoId::from(result.last_insert_rowid());
        todo.created = created;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %todo.id.as_str()))]
    async fn update(&self, todo: &mut Todo) -> Result<(), StoreError> {
        let Some(key) = row_key(&todo.id) else {
            return Err(StoreError::NotFound(todo.id.clone()));
        };

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE todo SET title = ?, status = ? WHERE id = ?")
            .bind(todo.title.as_str())
            .bind(todo.status.as_str())
            .bind(key)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(todo.id.clone()));
        }

        let created: DateTime<Utc> = sqlx::query_scalar("SELECT created FROM todo WHERE id = ?")
            .bind(key)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        todo.created = created;

        Ok(())
    }
}

#[async_trait]
impl Store for SqlStore {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let rows: Vec<TodoRow> = sqlx::query_as(
            "SELECT id, title, status, created
            FROM todo
            ORDER BY created DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TodoRow::into_todo).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find(&self, id: &TodoId) -> Result<Todo, StoreError> {
        let Some(key) = row_key(id) else {
            return Err(StoreError::NotFound(id.clone()));
        };

        let row: Option<TodoRow> = sqlx::query_as(
            "SELECT id, title, status, created
            FROM todo
            WHERE id = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_todo(),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn save(&self, todo: &mut Todo) -> Result<(), StoreError> {
        if todo.is_new() {
            self.insert(todo).await
        } else {
            self.update(todo).await
        }
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        let Some(key) = row_key(id) else {
            return Err(StoreError::NotFound(id.clone()));
        };

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM todo WHERE id = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%status))]
    async fn filter(&self, status: TodoStatus) -> Result<Vec<Todo>, StoreError> {
        let rows: Vec<TodoRow> = sqlx::query_as(
            "SELECT id, title, status, created
            FROM todo
            WHERE status = ?
            ORDER BY created DESC, id DESC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TodoRow::into_todo).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%status))]
    async fn clear(&self, status: TodoStatus) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM todo WHERE status = ?")
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn reset(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        execute_all(&mut tx, &DROP_TABLE).await?;
        execute_all(&mut tx, &CREATE_TABLE).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("closed sql store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_integer_ids_have_row_keys() {
        assert_eq!(row_key(&TodoId::new("17")), Some(17));
        assert_eq!(row_key(&TodoId::new("67e55044-10b1-426f-9247-bb680e5fe0c8")), None);
        assert_eq!(row_key(&TodoId::default()), None);
    }

    #[test]
    fn padded_or_signed_ids_have_no_row_keys() {
        assert_eq!(row_key(&TodoId::new("007")), None);
        assert_eq!(row_key(&TodoId::new("+7")), None);
        assert_eq!(row_key(&TodoId::new("0")), Some(0));
    }

    #[tokio::test]
    async fn reset_recreates_the_table() {
        let store = SqlStore::open("sqlite::memory:").await.unwrap();

        let mut todo = Todo::new("todo 1");
        store.save(&mut todo).await.unwrap();
        store.reset().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        let mut todo = Todo::new("todo 2");
        store.save(&mut todo).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![todo]);
    }

    #[test]
    fn unknown_status_in_a_row_is_corrupt() {
        let row = TodoRow {
            id: 1,
            title: "todo 1".to_string(),
            status: "archived".to_string(),
            created: Utc::now(),
        };
        assert!(matches!(row.into_todo(), Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn update_keeps_stored_timestamp() {
        let store = SqlStore::open("sqlite::memory:").await.unwrap();

        let mut todo = Todo::new("todo 1");
        store.save(&mut todo).await.unwrap();
        let created = todo.created;

        let mut edited = Todo {
            created: DateTime::<Utc>::default(),
            ..todo.clone()
        };
        edited.complete();
        store.save(&mut edited).await.unwrap();

        assert_eq!(edited.created, created);
    }
}
