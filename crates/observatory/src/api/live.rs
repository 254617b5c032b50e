use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use observatory_transcripts::{ActiveSession, CurrentSession, ParsedEvent};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<ActiveSession>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub events: Vec<ParsedEvent>,
    pub count: usize,
}

impl EventList {
    fn new(session_id: Option<String>, events: Vec<ParsedEvent>) -> Self {
        Self {
            session_id,
            count: events.len(),
            events,
        }
    }
}

pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionList> {
    let sessions = state.store.active_sessions();
    Json(SessionList {
        count: sessions.len(),
        sessions,
    })
}

pub async fn live_events(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<EventList> {
    let events = state.store.live_events(params.limit.unwrap_or(100));
    Json(EventList::new(None, events))
}

pub async fn current_session(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<CurrentSession> {
    Json(state.store.current_session(params.limit.unwrap_or(50)))
}

pub async fn session_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Json<EventList> {
    let events = state.store.session_events(&id, params.limit.unwrap_or(50));
    Json(EventList::new(Some(id), events))
}

pub async fn replay_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<EventList> {
    let events = state.store.replay_session(&id);
    Json(EventList::new(Some(id), events))
}
