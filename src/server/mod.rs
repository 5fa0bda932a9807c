//! HTTP API server.
//!
//! Exposes OCR upload, stored text retrieval, similarity search,
//! summarization, projects, local model listing and analytics as JSON.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;

use crate::config::Settings;
use crate::services::Services;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            services: Services::from_settings(settings).await?,
        })
    }

    pub fn with_services(services: Services) -> Self {
        Self { services }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let app = create_router(state);

    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
