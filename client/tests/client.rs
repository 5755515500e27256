use std::{net::SocketAddr, sync::Arc, time::Duration};

use back::{store, AppState};
use pretty_assertions::assert_eq;
use todos_api::v1::{Todo, TodoId, TodoStatus, DEFAULT_PREFIX};
use todos_client::{reqwest::StatusCode, TodoClient};
use tokio::net::TcpListener;

async fn spawn_server(url: &str) -> SocketAddr {
    let store = store::open(url).await.unwrap();
    let app = back::app(Arc::new(AppState::new(store)), DEFAULT_PREFIX);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        back::run(listener, app, std::future::pending()).await.unwrap();
    });

    addr
}

async fn client(url: &str) -> TodoClient {
    let addr = spawn_server(url).await;
    TodoClient::new(format!("http://{addr}"))
}

#[tokio::test]
async fn create_update_find_delete() {
    for url in ["sqlite::memory:", "memory://"] {
        let mut client = client(url).await;

        // create
        let mut todo = client.create(&Todo::new("todo 1")).await.unwrap().unwrap();
        assert_eq!(client.status(), Some(StatusCode::CREATED));
        assert!(!todo.is_new());
        assert_eq!(todo.status, TodoStatus::Active);

        // update
        todo.complete();
        let updated = client.update(&todo).await.unwrap().unwrap();
        assert_eq!(client.status(), Some(StatusCode::OK));
        assert_eq!(updated, todo);

        // find
        let found = client.find(&todo.id).await.unwrap().unwrap();
        assert_eq!(found, todo);

        // filter
        let completed = client.filter(TodoStatus::Completed).await.unwrap().unwrap();
        assert_eq!(completed, vec![todo.clone()]);

        // delete
        assert!(client.delete(&todo.id).await.unwrap());
        assert_eq!(client.status(), Some(StatusCode::NO_CONTENT));

        // gone
        assert_eq!(client.find(&todo.id).await.unwrap(), None);
        assert_eq!(client.status(), Some(StatusCode::NOT_FOUND));
        assert!(!client.delete(&todo.id).await.unwrap());
        assert_eq!(client.status(), Some(StatusCode::NOT_FOUND));
    }
}

#[tokio::test]
async fn filter_and_clear() {
    let mut client = client("sqlite::memory:").await;

    for title in ["todo 1", "todo 2", "todo 3"] {
        client.create(&Todo::new(title)).await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let mut todos = client.list().await.unwrap().unwrap();
    let titles: Vec<_> = todos.iter().map(|todo| todo.title.as_str()).collect();
    assert_eq!(titles, ["todo 3", "todo 2", "todo 1"]);

    todos[0].complete();
    client.update(&todos[0]).await.unwrap().unwrap();

    assert_eq!(client.clear(TodoStatus::Completed).await.unwrap(), Some(1));
    assert_eq!(client.clear(TodoStatus::Completed).await.unwrap(), Some(0));
    assert_eq!(client.clear(TodoStatus::Active).await.unwrap(), Some(2));
    assert_eq!(client.list().await.unwrap(), Some(Vec::new()));
}

#[tokio::test]
async fn failed_calls_decode_nothing() {
    let mut client = client("memory://").await;

    let mut ghost = Todo::new("ghost");
    ghost.id = TodoId::new("42");
    assert_eq!(client.update(&ghost).await.unwrap(), None);
    assert_eq!(client.status(), Some(StatusCode::NOT_FOUND));

    assert_eq!(client.create(&Todo::new(" ")).await.unwrap(), None);
    assert_eq!(client.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn transport_errors_clear_the_status() {
    let mut client = client("memory://").await;
    client.list().await.unwrap();
    assert_eq!(client.status(), Some(StatusCode::OK));

    // nothing listens on the discard port
    let mut client = TodoClient::new("http://127.0.0.1:9");
    assert!(client.list().await.is_err());
    assert_eq!(client.status(), None);
}
