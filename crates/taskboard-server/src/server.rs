//! Process wiring
//!
//! Opens the store, then runs the HTTP API and the realtime gateway side by
//! side until either fails or Ctrl-C arrives.

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::{Context, Result};
use taskboard_core::{BoardService, BoardStore, Broadcaster, Config, Gateway};
use tokio::net::TcpListener;
use tracing::info;

use crate::api;

/// Build the service from configuration
pub fn open_service(config: &Config) -> Result<BoardService> {
    let store = BoardStore::open(config).map_err(|e| {
        let message = match e.recovery_suggestion() {
            Some(hint) => format!("Failed to open board database. {}", hint),
            None => "Failed to open board database".to_string(),
        };
        anyhow::Error::new(e).context(message)
    })?;
    Ok(BoardService::new(store, Arc::new(Broadcaster::new()), config))
}

/// Run both listeners
pub async fn run(config: Config) -> Result<()> {
    let service = open_service(&config)?;
    info!(
        "Serving board {} from {:?}",
        service.board_id(),
        config.sqlite_path()
    );

    let gateway = Gateway::bind(config.ws_addr, service.broadcaster().clone()).await?;

    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP API on {}", config.http_addr))?;
    info!("HTTP API listening on http://{}", listener.local_addr()?);

    let app = api::router(service, &config.allowed_origins);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("HTTP server failed")?;
        }
        result = gateway.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
