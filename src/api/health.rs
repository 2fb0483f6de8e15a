use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::EngineStatsSnapshot;
use crate::server::AppState;
use crate::subscription::RegistryStats;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub service: String,
    pub reclaim_tokens_on_empty: bool,
    pub registry: RegistryStats,
    pub device_tokens: usize,
    pub transport: String,
    pub engine: EngineStatsSnapshot,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        service: state.settings.telemetry.service_name.clone(),
        reclaim_tokens_on_empty: state.settings.registry.reclaim_tokens_on_empty,
        registry: state.engine.registry_stats(),
        device_tokens: state.engine.tokens().len(),
        transport: state.engine.transport_name().to_string(),
        engine: state.engine.stats(),
    })
}
