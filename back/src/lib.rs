//! Todo list server.
//!
//! Serves the routes of [`todos_api::v1::Route`] under a configurable prefix
//! and keeps todos in whichever [`store::Store`] the database url selects.

pub mod config;
pub mod error;
pub mod store;
mod v1;

use std::{future::Future, io, sync::Arc};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;

use crate::store::Store;

pub struct AppState {
    pub store: Box<dyn Store>,
}

impl AppState {
    pub fn new(store: Box<dyn Store>) -> Self {
        Self { store }
    }
}

pub fn app(state: Arc<AppState>, prefix: &str) -> Router {
    v1::router(prefix)
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

pub async fn run(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
