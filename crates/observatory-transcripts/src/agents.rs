use chrono::{DateTime, Utc};

use crate::discovery::{find_recent_files, is_agent_transcript};
use crate::reader::read_lines;
use crate::store::{minutes, TranscriptStore};
use crate::summary::summarize_agent;
use crate::types::{AgentStats, AgentSummary, SessionStatus};

impl TranscriptStore {
    /// Agents whose transcript changed within `window_minutes`, newest first.
    pub fn recent_agents(&self, window_minutes: u32) -> Vec<AgentSummary> {
        self.recent_agents_at(window_minutes, Utc::now())
    }

    /// Agents spawned by the given parent session.
    pub fn agents_for_session(&self, session_id: &str) -> Vec<AgentSummary> {
        self.recent_agents(self.windows().agent_lookup_minutes)
            .into_iter()
            .filter(|a| a.session_id == session_id)
            .collect()
    }

    pub fn agent(&self, agent_id: &str) -> Option<AgentSummary> {
        self.recent_agents(self.windows().agent_lookup_minutes)
            .into_iter()
            .find(|a| a.agent_id == agent_id)
    }

    /// Counts by status, model and type over the default agent window.
    pub fn agent_stats(&self) -> AgentStats {
        let agents = self.recent_agents(self.windows().agents_minutes);

        let mut stats = AgentStats {
            total: agents.len(),
            ..Default::default()
        };

        for agent in &agents {
            match agent.status {
                SessionStatus::Active => stats.active += 1,
                SessionStatus::Completed => stats.completed += 1,
            }
            *stats.by_model.entry(agent.model.clone()).or_insert(0) += 1;
            *stats
                .by_type
                .entry(agent.agent_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        stats
    }

    fn recent_agents_at(&self, window_minutes: u32, now: DateTime<Utc>) -> Vec<AgentSummary> {
        let status_window = minutes(self.windows().active_status_minutes);

        find_recent_files(
            self.agents_dir(),
            is_agent_transcript,
            minutes(window_minutes),
            now,
        )
        .into_iter()
        .filter_map(|file| match read_lines(&file.path) {
            Ok(lines) => summarize_agent(&lines, &file, now, status_window),
            Err(e) => {
                tracing::debug!("Skipping agent transcript: {}", e);
                None
            }
        })
        .collect()
    }
}
