use shoppy_globe::config::AppConfig;
use shoppy_globe::router::create_app_router;
use shoppy_globe::session::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shoppy_globe=info,tower_http=info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        catalog = %config.catalog_base_url,
        timeout_secs = config.catalog_timeout.as_secs(),
        "configuration loaded"
    );

    // Initialize application state
    let state = Arc::new(AppState::from_config(&config)?);

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
