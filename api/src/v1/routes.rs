//! The route table shared by the router and the client.
//!
//! Id and status routes share the `{prefix}/{segment}` shape, so a segment
//! is told apart by its grammar: digits or a hyphenated UUID name a todo,
//! lowercase letters name a status.

use uuid::Uuid;

use super::TodoId;

pub const DEFAULT_PREFIX: &str = "/api/todos";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    List,
    Create,
    Find,
    Update,
    Delete,
    Filter,
    Clear,
}

impl Route {
    pub fn name(self) -> &'static str {
        match self {
            Route::List => "Todo.List",
            Route::Create => "Todo.Create",
            Route::Find => "Todo.Find",
            Route::Update => "Todo.Update",
            Route::Delete => "Todo.Delete",
            Route::Filter => "Todo.Filter",
            Route::Clear => "Todo.Clear",
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Route::List | Route::Find | Route::Filter => "GET",
            Route::Create => "POST",
            Route::Update => "PUT",
            Route::Delete | Route::Clear => "DELETE",
        }
    }

    /// Status code the server answers with when the call succeeds.
    pub fn success_status(self) -> u16 {
        match self {
            Route::Create => 201,
            Route::Delete => 204,
            _ => 200,
        }
    }
}

pub fn collection_path(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_string()
}

pub fn member_path(prefix: &str, segment: &str) -> String {
    format!("{}/{segment}", collection_path(prefix))
}

/// What the trailing path segment of a member route addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Id(TodoId),
    Status(String),
}

impl Segment {
    pub fn classify(segment: &str) -> Option<Self> {
        if segment.is_empty() {
            return None;
        }

        if segment.bytes().all(|b| b.is_ascii_digit()) {
            return Some(Segment::Id(TodoId::new(segment)));
        }

        if segment.bytes().all(|b| b.is_ascii_lowercase()) {
            return Some(Segment::Status(segment.to_string()));
        }

        // only the hyphenated form, so a status token never parses as a key
        if segment.len() == 36 && Uuid::try_parse(segment).is_ok() {
            return Some(Segment::Id(TodoId::new(segment)));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_uuids_are_ids() {
        assert_eq!(Segment::classify("42"), Some(Segment::Id(TodoId::new("42"))));

        let key = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(Segment::classify(key), Some(Segment::Id(TodoId::new(key))));
    }

    #[test]
    fn lowercase_words_are_statuses() {
        assert_eq!(
            Segment::classify("completed"),
            Some(Segment::Status("completed".to_string()))
        );
        assert_eq!(
            Segment::classify("deadbeef"),
            Some(Segment::Status("deadbeef".to_string()))
        );
    }

    #[test]
    fn anything_else_is_unrouted() {
        assert_eq!(Segment::classify(""), None);
        assert_eq!(Segment::classify("Active"), None);
        assert_eq!(Segment::classify("12ab"), None);
        assert_eq!(Segment::classify("67e5504410b1426f9247bb680e5fe0c8"), None);
    }

    #[test]
    fn paths_follow_prefix() {
        assert_eq!(collection_path(DEFAULT_PREFIX), "/api/todos");
        assert_eq!(collection_path("/todos/"), "/todos");
        assert_eq!(member_path("/todos/", "7"), "/todos/7");
        assert_eq!(member_path(DEFAULT_PREFIX, "active"), "/api/todos/active");
    }

    #[test]
    fn success_codes() {
        assert_eq!(Route::Create.success_status(), 201);
        assert_eq!(Route::Delete.success_status(), 204);
        assert_eq!(Route::Clear.success_status(), 200);
    }
}
