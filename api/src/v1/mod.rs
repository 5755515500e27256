mod routes;

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub use routes::{collection_path, member_path, Route, Segment, DEFAULT_PREFIX};

/// Identifier assigned by the store on first save.
///
/// Relational stores hand out decimal auto-increment keys, document stores
/// hand out UUIDs. An empty id means the todo was never persisted.
///
/// Encoded as a string. Integer ids, as older clients send them, decode to
/// their decimal form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TodoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl de::Visitor<'_> for IdVisitor {
            type Value = TodoId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a todo id string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TodoId, E> {
                Ok(TodoId::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<TodoId, E> {
                Ok(TodoId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TodoId, E> {
                Ok(TodoId::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TodoId, E> {
                Ok(TodoId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

impl From<i64> for TodoId {
    fn from(key: i64) -> Self {
        Self(key.to_string())
    }
}

impl From<Uuid> for TodoId {
    fn from(key: Uuid) -> Self {
        Self(key.hyphenated().to_string())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    #[default]
    Active,
    #[serde(alias = "complete")]
    Completed,
}

impl TodoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Active => "active",
            TodoStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for TodoStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TodoStatus::Active),
            "completed" | "complete" => Ok(TodoStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(default)]
    pub id: TodoId,
    #[serde(alias = "text")]
    pub title: String,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub created: DateTime<Utc>,
}

impl Todo {
    /// An unsaved, active todo.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn complete(&mut self) {
        self.status = TodoStatus::Completed;
    }

    pub fn is_completed(&self) -> bool {
        self.status == TodoStatus::Completed
    }

    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id:{}, title:{}, status:{}, created:{}",
            self.id, self.title, self.status, self.created
        )
    }
}

/// Body of a successful clear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cleared {
    pub count: u64,
}

/// Newest first.
pub fn sort_by_created(todos: &mut [Todo]) {
    todos.sort_unstable_by(|a, b| (a.created, &a.id).cmp(&(b.created, &b.id)).reverse());
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn new_todo_is_active_and_unsaved() {
        let todo = Todo::new("todo 1");
        assert_eq!(todo.status, TodoStatus::Active);
        assert!(todo.is_new());
        assert_eq!(todo.created, DateTime::<Utc>::default());
    }

    #[test]
    fn complete_marks_todo_completed() {
        let mut todo = Todo::new("todo 1");
        todo.complete();
        assert!(todo.is_completed());
    }

    #[test]
    fn decode_fills_defaults() {
        let todo: Todo = serde_json::from_str(r#"{"title":"Buy milk"}"#).unwrap();
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.status, TodoStatus::Active);
        assert!(todo.id.is_empty());
    }

    #[test]
    fn decode_accepts_older_field_and_status_names() {
        let todo: Todo =
            serde_json::from_str(r#"{"id":"7","text":"Walk dog","status":"complete"}"#).unwrap();
        assert_eq!(todo.id, TodoId::new("7"));
        assert_eq!(todo.title, "Walk dog");
        assert_eq!(todo.status, TodoStatus::Completed);
    }

    #[test]
    fn decode_accepts_integer_ids() {
        let todo: Todo = serde_json::from_str(r#"{"id":7,"text":"todo 1"}"#).unwrap();
        assert_eq!(todo.id, TodoId::new("7"));

        let ids: Vec<TodoId> = serde_json::from_str(r#"["12", 12, "0b7e-x"]"#).unwrap();
        assert_eq!(ids, [TodoId::new("12"), TodoId::new("12"), TodoId::new("0b7e-x")]);

        assert!(serde_json::from_str::<TodoId>("1.5").is_err());
        assert!(serde_json::from_str::<TodoId>("null").is_err());
    }

    #[test]
    fn decode_rejects_missing_title() {
        let result: Result<Todo, _> = serde_json::from_str(r#"{"status":"active"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn encode_uses_lowercase_status_and_string_id() {
        let todo = Todo {
            id: TodoId::from(42),
            title: "Test".to_string(),
            status: TodoStatus::Completed,
            created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["created"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn status_parses_alias() {
        assert_eq!("complete".parse::<TodoStatus>(), Ok(TodoStatus::Completed));
        assert_eq!("completed".parse::<TodoStatus>(), Ok(TodoStatus::Completed));
        assert_eq!("active".parse::<TodoStatus>(), Ok(TodoStatus::Active));
        assert!("done".parse::<TodoStatus>().is_err());
    }

    #[test]
    fn sort_puts_newest_first() {
        let mut todos: Vec<Todo> = (1..=3)
            .map(|day| Todo {
                created: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
                ..Todo::new(format!("todo {day}"))
            })
            .collect();

        sort_by_created(&mut todos);

        let titles: Vec<_> = todos.iter().map(|todo| todo.title.as_str()).collect();
        assert_eq!(titles, ["todo 3", "todo 2", "todo 1"]);
    }
}
