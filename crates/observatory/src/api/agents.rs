use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use observatory_transcripts::{AgentStats, AgentSummary};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct AgentsParams {
    pub minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub agents: Vec<AgentSummary>,
    pub count: usize,
}

impl AgentList {
    fn new(session_id: Option<String>, agents: Vec<AgentSummary>) -> Self {
        Self {
            session_id,
            count: agents.len(),
            agents,
        }
    }
}

pub async fn list_agents(
    State(state): State<AppState>,
    Query(params): Query<AgentsParams>,
) -> Json<AgentList> {
    let minutes = params
        .minutes
        .unwrap_or(state.store.windows().agents_minutes);
    Json(AgentList::new(None, state.store.recent_agents(minutes)))
}

pub async fn agent_stats(State(state): State<AppState>) -> Json<AgentStats> {
    Json(state.store.agent_stats())
}

pub async fn agents_for_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<AgentList> {
    let agents = state.store.agents_for_session(&id);
    Json(AgentList::new(Some(id), agents))
}

pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentSummary>, ApiError> {
    state
        .store
        .agent(&id)
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Agent not found"))
}
