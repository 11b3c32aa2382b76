use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use dotenvy::dotenv;
use fleetlink_common::GatewayConfig;
use fleetlink_gateway::handlers;
use fleetlink_gateway::state::AppState;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "fleetlink_gateway=info,axum=info".to_string()),
        )
        .init();

    info!("🚀 Starting Fleetlink Gateway v0.1.0");

    let config = GatewayConfig::from_env();
    let metrics_handle = PrometheusBuilder::new().install_recorder()?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = AppState::new(config.clone(), metrics_handle).await?;
    info!("✅ Connected to MySQL and Redis");

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/upload-packets", post(handlers::upload::upload_packets))
        .route("/api/latest-avl", get(handlers::fixes::latest_fixes))
        .route("/metrics", get(handlers::metrics::prometheus_metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("🌐 Gateway listening on {}", addr);
    info!("📊 Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.map_err(|e| {
        error!("Server error: {}", e);
        e
    })?;

    Ok(())
}
