// Latest-fixes query handler
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub limit: Option<u32>,
}

/// A persisted fix row. Stub rows created at upload time carry zeroed
/// telemetry until the matching packet arrives.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FixRow {
    pub id: i64,
    pub camera_id: i64,
    pub timestamp: NaiveDateTime,
    pub file_path: String,
    pub lat: f64,
    pub lon: f64,
    pub speed: i32,
    pub altitude: i32,
    pub angle: i32,
    pub satellites: i32,
    pub upload_ref: Option<String>,
    pub imei: Option<String>,
}

pub async fn latest_fixes(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Vec<FixRow>>, StatusCode> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let rows = sqlx::query_as::<_, FixRow>(
        "SELECT id, camera_id, timestamp, file_path, lat, lon, speed, altitude, angle, \
         satellites, upload_ref, imei \
         FROM camera_files ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!("Failed to fetch latest fixes: {}", e);
        state.metrics.record_http_request("/api/latest-avl", 500);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    state.metrics.record_http_request("/api/latest-avl", 200);
    Ok(Json(rows))
}
