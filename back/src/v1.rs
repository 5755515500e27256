use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use todos_api::v1::{
    collection_path, member_path, Cleared, Route, Segment, Todo, TodoId, TodoStatus, UnknownStatus,
};
use tracing::info;

use crate::{error::ApiError, AppState};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

type ApiResult = Result<Response, ApiError>;

/// Id and status routes share one path; the segment grammar decides which
/// handler runs.
pub fn router(prefix: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(&collection_path(prefix), get(list_todos).post(create_todo))
        .route(
            &member_path(prefix, ":segment"),
            get(find_or_filter).put(update_todo).delete(delete_or_clear),
        )
}

async fn list_todos(State(state): State<Arc<AppState>>) -> ApiResult {
    let todos = state.store.list().await?;
    json(StatusCode::OK, &todos)
}

async fn create_todo(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult {
    let mut todo = decode(&body)?;
    todo.id = TodoId::default();
    validate(&todo)?;

    state.store.save(&mut todo).await?;

    info!(
        route = Route::Create.name(),
        id = %todo.id,
        title = %todo.title,
        "created todo"
    );

    json(StatusCode::CREATED, &todo)
}

async fn find_or_filter(
    State(state): State<Arc<AppState>>,
    Path(segment): Path<String>,
) -> ApiResult {
    match classify(&segment)? {
        Segment::Id(id) => find_todo(&state, &id).await,
        Segment::Status(status) => filter_todos(&state, parse_status(&status)?).await,
    }
}

async fn find_todo(state: &AppState, id: &TodoId) -> ApiResult {
    let todo = state.store.find(id).await?;
    json(StatusCode::OK, &todo)
}

async fn filter_todos(state: &AppState, status: TodoStatus) -> ApiResult {
    let todos = state.store.filter(status).await?;
    json(StatusCode::OK, &todos)
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(segment): Path<String>,
    body: Bytes,
) -> ApiResult {
    let Some(Segment::Id(id)) = Segment::classify(&segment) else {
        return Err(unrouted(&segment));
    };

    let mut todo = decode(&body)?;
    if todo.id != id {
        return Err(ApiError::bad_request(format!(
            "path id {:?} does not match body id {:?}",
            id.as_str(),
            todo.id.as_str()
        )));
    }
    validate(&todo)?;

    state.store.save(&mut todo).await?;

    info!(
        route = Route::Update.name(),
        id = %todo.id,
        status = %todo.status,
        "updated todo"
    );

    json(StatusCode::OK, &todo)
}

async fn delete_or_clear(
    State(state): State<Arc<AppState>>,
    Path(segment): Path<String>,
) -> ApiResult {
    match classify(&segment)? {
        Segment::Id(id) => delete_todo(&state, &id).await,
        Segment::Status(status) => clear_todos(&state, parse_status(&status)?).await,
    }
}

async fn delete_todo(state: &AppState, id: &TodoId) -> ApiResult {
    state.store.delete(id).await?;

    info!(route = Route::Delete.name(), %id, "deleted todo");

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn clear_todos(state: &AppState, status: TodoStatus) -> ApiResult {
    let count = state.store.clear(status).await?;

    info!(route = Route::Clear.name(), %status, count, "cleared todos");

    json(StatusCode::OK, &Cleared { count })
}

fn classify(segment: &str) -> Result<Segment, ApiError> {
    Segment::classify(segment).ok_or_else(|| unrouted(segment))
}

fn unrouted(segment: &str) -> ApiError {
    ApiError::not_found(format!("no todo route for {segment:?}"))
}

fn parse_status(status: &str) -> Result<TodoStatus, ApiError> {
    status
        .parse()
        .map_err(|err: UnknownStatus| ApiError::bad_request(err.to_string()))
}

// the content type is not checked, any body that decodes is accepted
fn decode(body: &[u8]) -> Result<Todo, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::bad_request(err.to_string()))
}

fn validate(todo: &Todo) -> Result<(), ApiError> {
    if todo.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    Ok(())
}

fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> ApiResult {
    let body = serde_json::to_vec(value).map_err(|err| ApiError::internal(err.to_string()))?;
    Ok((status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}
