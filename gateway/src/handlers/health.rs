// Health check handler
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_healthy = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    let redis_healthy = state.imei_cache.ping().await;

    let response = json!({
        "status": "ok",
        "service": "fleetlink-gateway",
        "version": "0.1.0",
        "timestamp": chrono::Utc::now().timestamp(),
        "components": {
            "database": if db_healthy { "healthy" } else { "unhealthy" },
            "redis": if redis_healthy { "healthy" } else { "unhealthy" }
        }
    });

    state.metrics.record_http_request("/health", 200);

    Json(response)
}
