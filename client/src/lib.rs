//! Typed client for the todo service.
//!
//! Every call records the status code the server answered with, and only
//! decodes the body when that code is the route's success code.

use eyre::Context;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use todos_api::v1::{
    collection_path, member_path, Cleared, Route, Todo, TodoId, TodoStatus, DEFAULT_PREFIX,
};

pub use reqwest;

pub struct TodoClient {
    base_url: String,
    prefix: String,
    http: reqwest::Client,
    status: Option<StatusCode>,
}

impl TodoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            base_url,
            prefix: DEFAULT_PREFIX.to_string(),
            http: reqwest::Client::new(),
            status: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Status of the last response, `None` if the last call never got one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub async fn list(&mut self) -> eyre::Result<Option<Vec<Todo>>> {
        let url = self.collection_url();
        let response = self.send(Route::List, url, None).await?;
        decode(Route::List, response).await
    }

    /// Creates `todo` and returns it as stored, with id and timestamp set.
    pub async fn create(&mut self, todo: &Todo) -> eyre::Result<Option<Todo>> {
        let url = self.collection_url();
        let response = self.send(Route::Create, url, Some(todo)).await?;
        decode(Route::Create, response).await
    }

    pub async fn find(&mut self, id: &TodoId) -> eyre::Result<Option<Todo>> {
        let url = self.member_url(id.as_str());
        let response = self.send(Route::Find, url, None).await?;
        decode(Route::Find, response).await
    }

    pub async fn update(&mut self, todo: &Todo) -> eyre::Result<Option<Todo>> {
        let url = self.member_url(todo.id.as_str());
        let response = self.send(Route::Update, url, Some(todo)).await?;
        decode(Route::Update, response).await
    }

    /// Returns `true` when the todo existed and was deleted.
    pub async fn delete(&mut self, id: &TodoId) -> eyre::Result<bool> {
        let url = self.member_url(id.as_str());
        let response = self.send(Route::Delete, url, None).await?;
        Ok(succeeded(Route::Delete, &response))
    }

    pub async fn filter(&mut self, status: TodoStatus) -> eyre::Result<Option<Vec<Todo>>> {
        let url = self.member_url(status.as_str());
        let response = self.send(Route::Filter, url, None).await?;
        decode(Route::Filter, response).await
    }

    /// Deletes every todo with `status`, returning how many went.
    pub async fn clear(&mut self, status: TodoStatus) -> eyre::Result<Option<u64>> {
        let url = self.member_url(status.as_str());
        let response = self.send(Route::Clear, url, None).await?;
        let cleared: Option<Cleared> = decode(Route::Clear, response).await?;
        Ok(cleared.map(|cleared| cleared.count))
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, collection_path(&self.prefix))
    }

    fn member_url(&self, segment: &str) -> String {
        format!("{}{}", self.base_url, member_path(&self.prefix, segment))
    }

    async fn send(
        &mut self,
        route: Route,
        url: String,
        body: Option<&Todo>,
    ) -> eyre::Result<Response> {
        self.status = None;

        let method = Method::from_bytes(route.method().as_bytes())
            .wrap_err_with(|| format!("{} has no valid method", route.name()))?;

        let mut request = self.http.request(method, url);
        if let Some(todo) = body {
            request = request.json(todo);
        }

        let response = request
            .send()
            .await
            .wrap_err_with(|| format!("{} request failed", route.name()))?;

        self.status = Some(response.status());
        Ok(response)
    }
}

fn succeeded(route: Route, response: &Response) -> bool {
    response.status().as_u16() == route.success_status()
}

async fn decode<T: DeserializeOwned>(route: Route, response: Response) -> eyre::Result<Option<T>> {
    if !succeeded(route, &response) {
        return Ok(None);
    }

    let value = response
        .json()
        .await
        .wrap_err_with(|| format!("{} returned a malformed body", route.name()))?;

    Ok(Some(value))
}
