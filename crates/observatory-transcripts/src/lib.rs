//! # observatory-transcripts
//!
//! Read-only parsing and live aggregation over an AI coding assistant's
//! JSON-lines transcripts.
//!
//! ## Key Types
//!
//! - [`TranscriptStore`] - Query façade (active sessions, live events, agents)
//! - [`TranscriptEntry`] - One decoded transcript line
//! - [`ParsedEvent`] - Display-ready event extracted from a line
//! - [`TranscriptWatcher`] - Optional change notifications for push clients
//!
//! Every query rescans the filesystem. Missing directories, unreadable files
//! and malformed lines degrade to empty or partial results, never errors.

mod agents;
pub mod cost;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod models;
pub mod reader;
pub mod store;
pub mod summary;
pub mod types;
pub mod watcher;

pub use cost::{stats_cache_info, CostReport, StatsCache, StatsCacheInfo};
pub use discovery::{find_containers, find_recent_files, FileEntry};
pub use error::TranscriptError;
pub use extract::{extract_events, replay_events};
pub use models::{calculate_cost, normalize_model_name, TokenCounts};
pub use reader::{parse_line, read_lines};
pub use store::{QueryWindows, StoreConfig, TranscriptStore};
pub use summary::{infer_agent_type, summarize_agent, summarize_session};
pub use types::{
    ActiveSession, AgentStats, AgentSummary, AgentType, ContentBlock, CurrentSession,
    EventPayload, ParsedEvent, SessionStatus, TranscriptEntry,
};
pub use watcher::{TranscriptChange, TranscriptWatcher};
