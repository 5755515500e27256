use std::sync::Arc;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use back::{config::Config, store, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    let store = store::open(&config.database_url).await?;
    let state = Arc::new(AppState::new(store));
    let app = back::app(state.clone(), &config.prefix);
    let addr = config.addr();

    if let Some((cert, key)) = config.tls() {
        let tls = RustlsConfig::from_pem_file(cert, key).await?;

        let handle = Handle::new();
        tokio::spawn({
            let handle = handle.clone();
            async move {
                shutdown_signal().await;
                handle.graceful_shutdown(None);
            }
        });

        tracing::info!(%addr, prefix = %config.prefix, "serving https");

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(%addr, prefix = %config.prefix, "serving http");

        back::run(listener, app, shutdown_signal()).await?;
    }

    state.store.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {:?}", err);
        std::future::pending::<()>().await;
    }
}
