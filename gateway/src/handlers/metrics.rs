// Prometheus metrics handler
use axum::{extract::State, http::StatusCode, response::Response};

use crate::state::AppState;

pub async fn prometheus_metrics(State(state): State<AppState>) -> Result<Response<String>, StatusCode> {
    let metrics_output = state.metrics_handle.render();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
        .body(metrics_output)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(response)
}
