use tracing_subscriber::EnvFilter;

use visa_portal_api::api::{self, AppState, Backends};
use visa_portal_api::config::AppConfig;
use visa_portal_api::schema;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting Visa Portal API in {:?} mode", config.environment);

    schema::check_consistency()?;

    let backends = Backends::connect(&config).await?;
    let app = api::app(AppState::new(backends), &config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Visa Portal API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
