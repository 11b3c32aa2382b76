// Fleetlink ingest service - TCP telemetry listener
use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use fleetlink_common::{IngestConfig, MetricsCollector};
use fleetlink_ingest::{
    IngestServer, KafkaFixPublisher, MediaStore, MySqlRecordStore, SessionTracker, SinkGateway,
};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fleetlink_ingest=info".to_string()),
        )
        .init();

    info!("🚀 Starting Fleetlink Ingest v0.1.0");

    let config = IngestConfig::from_env();

    // Prometheus exporter on its own listener
    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
    {
        Ok(()) => info!("📊 Prometheus metrics available at http://{}/metrics", metrics_addr),
        Err(e) => error!("Failed to start metrics exporter: {}", e),
    }

    let metrics = Arc::new(MetricsCollector::new());
    let tracker = Arc::new(SessionTracker::new());

    let media = MediaStore::new(&config.upload_dir).await?;
    let store = Arc::new(MySqlRecordStore::connect_lazy(&config.database_url)?);
    let publisher = Arc::new(KafkaFixPublisher::new(
        &config.kafka_brokers,
        &config.kafka_topic,
    )?);

    let sinks = Arc::new(SinkGateway::new(store, publisher, media, metrics.clone()));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("✅ Ingest listening on {}", config.bind_addr);

    let server = Arc::new(IngestServer::new(tracker, sinks, metrics));
    server.run(listener).await;

    Ok(())
}
