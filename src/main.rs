use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use medspa_booking::clock::SystemClock;
use medspa_booking::config::AppConfig;
use medspa_booking::db;
use medspa_booking::handlers;
use medspa_booking::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    if config.seed_demo_data {
        db::seed::seed_demo_data(&conn)?;
    }
    if config.api_key == "medspa-demo-api-key-2024" {
        tracing::warn!("using the demo API key; set API_KEY in production");
    }

    let state = Arc::new(AppState::new(conn, config.clone(), Box::new(SystemClock)));

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        slot_minutes = config.slot_minutes,
        database = %config.database_url,
        "starting server on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
