use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::discovery::{find_recent_files, is_transcript, FileEntry};
use crate::extract::{extract_events, replay_events};
use crate::reader::{parse_line, parse_lines, read_lines, tail_lines};
use crate::summary::{summarize_session, TranscriptFold};
use crate::types::{ActiveSession, CurrentSession, ParsedEvent};

/// Recency windows and caps used by the live queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryWindows {
    pub active_sessions_minutes: u32,
    pub active_sessions_cap: usize,
    pub session_events_minutes: u32,
    pub live_events_minutes: u32,
    pub live_files_cap: usize,
    pub live_tail_lines: usize,
    pub agents_minutes: u32,
    pub agent_lookup_minutes: u32,
    pub active_status_minutes: u32,
}

impl Default for QueryWindows {
    fn default() -> Self {
        Self {
            active_sessions_minutes: 60,
            active_sessions_cap: 10,
            session_events_minutes: 120,
            live_events_minutes: 30,
            live_files_cap: 5,
            live_tail_lines: 20,
            agents_minutes: 120,
            agent_lookup_minutes: 240,
            active_status_minutes: 5,
        }
    }
}

pub(crate) fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

/// Where transcripts live and how far back each query looks.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub projects_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub windows: QueryWindows,
}

/// Read-only query façade over the assistant's transcript directories.
///
/// Nothing is cached: every call rescans the filesystem, so two calls against
/// an unchanged file set return identical results. Unreadable files and
/// malformed lines contribute nothing rather than failing the query.
pub struct TranscriptStore {
    config: StoreConfig,
}

impl TranscriptStore {
    /// Create a store reading sessions and agents from the same directory.
    pub fn with_dir(projects_dir: PathBuf) -> Self {
        Self::with_config(StoreConfig {
            agents_dir: projects_dir.clone(),
            projects_dir,
            windows: QueryWindows::default(),
        })
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn projects_dir(&self) -> &Path {
        &self.config.projects_dir
    }

    pub fn agents_dir(&self) -> &Path {
        &self.config.agents_dir
    }

    pub fn windows(&self) -> &QueryWindows {
        &self.config.windows
    }

    pub(crate) fn recent_transcripts(&self, window_minutes: u32, now: DateTime<Utc>) -> Vec<FileEntry> {
        find_recent_files(
            &self.config.projects_dir,
            is_transcript,
            minutes(window_minutes),
            now,
        )
    }

    /// Most recently touched transcripts, newest first.
    pub fn active_sessions(&self) -> Vec<ActiveSession> {
        let now = Utc::now();
        let w = &self.config.windows;

        self.recent_transcripts(w.active_sessions_minutes, now)
            .into_iter()
            .take(w.active_sessions_cap)
            .filter_map(|file| {
                let lines = match read_lines(&file.path) {
                    Ok(lines) => lines,
                    Err(e) => {
                        tracing::debug!("Skipping transcript: {}", e);
                        return None;
                    }
                };
                summarize_session(&lines, &file, now, minutes(w.active_status_minutes))
            })
            .collect()
    }

    /// Events for one session, most recent first, at most `limit`.
    ///
    /// Returns the events of the first recent file whose session id matches.
    /// A session rotated across several files yields only the newest one.
    pub fn session_events(&self, session_id: &str, limit: usize) -> Vec<ParsedEvent> {
        let Some(lines) = self.find_session_lines(session_id) else {
            return Vec::new();
        };

        let mut events: Vec<ParsedEvent> = parse_lines(&lines)
            .iter()
            .flat_map(extract_events)
            .collect();
        events.reverse();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        events
    }

    /// Full chronological event stream of a session, including user turns.
    pub fn replay_session(&self, session_id: &str) -> Vec<ParsedEvent> {
        match self.find_session_lines(session_id) {
            Some(lines) => replay_events(&parse_lines(&lines)),
            None => Vec::new(),
        }
    }

    /// Recent events across the newest transcripts, most recent first.
    ///
    /// Only the tail of each file is read since only recent activity matters.
    pub fn live_events(&self, limit: usize) -> Vec<ParsedEvent> {
        let now = Utc::now();
        let w = &self.config.windows;
        let mut events: Vec<ParsedEvent> = Vec::new();

        for file in self
            .recent_transcripts(w.live_events_minutes, now)
            .into_iter()
            .take(w.live_files_cap)
        {
            match tail_lines(&file.path, w.live_tail_lines) {
                Ok(lines) => {
                    events.extend(parse_lines(&lines).iter().flat_map(extract_events));
                }
                Err(e) => tracing::debug!("Skipping transcript: {}", e),
            }
        }

        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        events
    }

    /// The newest non-agent session (or newest of any kind) and its events.
    pub fn current_session(&self, limit: usize) -> CurrentSession {
        let sessions = self.active_sessions();

        let Some(main) = sessions
            .iter()
            .find(|s| !s.is_agent)
            .or_else(|| sessions.first())
            .cloned()
        else {
            return CurrentSession::default();
        };

        let events = self.session_events(&main.session_id, limit);
        CurrentSession {
            session: Some(main),
            events,
        }
    }

    fn find_session_lines(&self, session_id: &str) -> Option<Vec<String>> {
        let now = Utc::now();

        for file in self.recent_transcripts(self.config.windows.session_events_minutes, now) {
            let lines = match read_lines(&file.path) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::debug!("Skipping transcript: {}", e);
                    continue;
                }
            };

            if first_session_id(&lines).as_deref() == Some(session_id) {
                return Some(lines);
            }
        }

        None
    }
}

/// Session id seeded by the first line that carries one.
fn first_session_id(lines: &[String]) -> Option<String> {
    let mut fold = TranscriptFold::new();
    for line in lines {
        if let Some(entry) = parse_line(line) {
            fold.push(&entry);
            if fold.session_id.is_some() {
                break;
            }
        }
    }
    fold.session_id
}
