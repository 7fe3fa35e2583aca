use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;

mod handlers;
mod models;
mod state;
mod upload;

use examgen_core::Config;
use examgen_core::config_file::load_config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = Config::default().apply_file(&load_config());
    if let Ok(key) = std::env::var("GROQ_API_KEY") {
        config.api_key = Some(key);
    }
    if config.api_key.is_none() {
        eprintln!("Warning: no server API key; clients must supply their own");
    }

    let state = Arc::new(AppState { config });

    // Allow large scanned-exam uploads (50MB)
    let body_limit = axum::extract::DefaultBodyLimit::max(50 * 1024 * 1024);

    let app = axum::Router::new()
        .route("/api/analyze", axum::routing::post(handlers::analyze::analyze))
        .route(
            "/api/generate",
            axum::routing::post(handlers::generate::generate),
        )
        .route(
            "/api/download-pdf",
            axum::routing::post(handlers::download::download_pdf),
        )
        .route("/api/chat", axum::routing::post(handlers::chat::chat))
        .layer(CorsLayer::permissive())
        .layer(body_limit)
        .with_state(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5001);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
