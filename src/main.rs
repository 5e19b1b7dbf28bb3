use axum::Router;
use tokio::net::TcpListener;

use anyhow::anyhow;

use frontdesk::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env-filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frontdesk=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;
    let address = config.address();

    // Create application state
    let app_state = AppState::new(config);

    // Combine routers: service API + provider webhooks
    let app = Router::new()
        .merge(routes::api::create_api_router())
        .merge(routes::webhooks::create_webhook_router())
        .with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    tracing::info!(address = %address, "frontdesk listening");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
