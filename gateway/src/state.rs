// Application state for the upload gateway
use std::sync::Arc;

use fleetlink_common::{GatewayConfig, MetricsCollector, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::error;

use crate::imei::{ImeiCache, ImeiValidator};

#[derive(Clone)]
pub struct AppState {
    pub db: MySqlPool,
    pub imei_cache: Arc<dyn ImeiValidator>,
    pub metrics: Arc<MetricsCollector>,
    pub metrics_handle: PrometheusHandle,
    pub config: GatewayConfig,
}

impl AppState {
    pub async fn new(config: GatewayConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        let db = MySqlPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        let imei_cache = ImeiCache::connect(&config.redis_url).await?;
        // Provision the demo fleet so uploads validate out of the box
        if let Err(e) = imei_cache.seed_examples().await {
            error!("Failed to seed example fleet: {}", e);
        }

        let metrics = Arc::new(MetricsCollector::new());

        Ok(Self {
            db,
            imei_cache: Arc::new(imei_cache),
            metrics,
            metrics_handle,
            config,
        })
    }
}
