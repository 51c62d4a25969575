use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::history::HistoryCache;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    active_conversations: usize,
    memory_usage_mb: u64,
    memory_total_mb: u64,
    memory_usage_percent: f64,
    timestamp: DateTime<Utc>,
}

pub async fn health_check(State(history): State<HistoryCache>) -> (StatusCode, Json<HealthResponse>) {
    let stats = history.stats();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            active_conversations: stats.active_conversations,
            memory_usage_mb: stats.memory_usage_mb,
            memory_total_mb: stats.memory_total_mb,
            memory_usage_percent: stats.memory_usage_percent,
            timestamp: Utc::now(),
        }),
    )
}

pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
