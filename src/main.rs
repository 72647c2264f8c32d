// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::session_service::SessionService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::icc_pro_client::IccProConnector;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;
    if config.secrets.is_some() {
        tracing::info!("Default secrets configured");
    }

    // Create API connector (infrastructure layer)
    let connector = Arc::new(IccProConnector::new(config.api.timeout())?);

    // Create services (application layer)
    let sessions = SessionService::new(connector, config.server.session_ttl());

    // Create application state
    let state = Arc::new(AppState {
        sessions,
        default_credentials: config.secrets.clone(),
        resolutions: config.reports.resolutions(),
    });

    // Build router (presentation layer)
    let router = presentation::router::build(state);

    // Start server
    let addr = config.server.bind_address()?;
    tracing::info!("Starting parks-irrigation dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
