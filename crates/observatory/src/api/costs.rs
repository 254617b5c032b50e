use std::path::Path;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

use observatory_transcripts::{CostReport, StatsCache, StatsCacheInfo};

use super::{ApiError, AppState};

/// Cache metadata plus the computed report, `null` when there is no cache.
#[derive(Debug, Serialize)]
pub struct CostsResponse {
    pub cache: StatsCacheInfo,
    pub report: Option<CostReport>,
}

pub fn load_costs(path: &Path) -> anyhow::Result<CostsResponse> {
    let cache = StatsCache::load(path)?;
    Ok(CostsResponse {
        cache: StatsCacheInfo::describe(path, cache.as_ref()),
        report: cache.map(|c| c.cost_report()),
    })
}

pub async fn get_costs(State(state): State<AppState>) -> Result<Json<CostsResponse>, ApiError> {
    load_costs(&state.stats_cache)
        .map(Json)
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)))
}
