//! HTTP service.

pub mod app;
pub mod handlers;

use crate::backend::Backend;
use crate::config::Config;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub async fn start_server(config: &Config, backend: Arc<dyn Backend>) -> Result<()> {
    let state = app::AppState::new(backend, config.report.clone());
    let app = app::create_app(state, &config.server.cors_origin)?;

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    log_routes(&config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

fn log_routes(bind: &str) {
    info!("Server running on http://{}", bind);
    info!("API Endpoints:");
    info!("  GET    /health                                 - Health check");
    info!("  POST   /api/clientes/criar-acesso              - Client access provisioning");
    info!("  POST   /api/v1/client-access                   - Client access provisioning");
    info!("  GET    /api/v1/projects/:id/org-chart          - Org chart");
    info!("  GET    /api/v1/projects/:id/disc               - Team DISC summary");
    info!("  GET    /api/v1/projects/:id/climate            - Climate summary");
    info!("  POST   /api/v1/projects/:id/climate/responses  - Submit climate response");
    info!("  GET    /api/v1/projects/:id/report             - Executive report");
    info!("  POST   /api/v1/employees                       - Add employee");
    info!("  PUT    /api/v1/employees/:id                   - Edit employee");
    info!("  DELETE /api/v1/employees/:id                   - Deactivate employee");
    info!("  POST   /api/v1/employees/:id/disc              - Submit DISC questionnaire");
}
