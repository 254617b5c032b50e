use chrono::{DateTime, Duration, Utc};

use crate::discovery::FileEntry;
use crate::models::normalize_model_name;
use crate::reader::parse_line;
use crate::types::{
    ActiveSession, AgentSummary, AgentType, ContentBlock, SessionStatus, TranscriptEntry,
};

/// Files modified within this many minutes are considered active.
pub const ACTIVE_STATUS_MINUTES: i64 = 5;

/// Maximum stored length of an agent's first message, in characters.
pub const FIRST_MESSAGE_CHARS: usize = 200;

const EXPLORE_KEYWORDS: &[&str] = &["explore", "search", "find"];
const PLAN_KEYWORDS: &[&str] = &["plan", "architect", "design"];
const REVIEW_KEYWORDS: &[&str] = &["review", "audit", "check"];
const GENERAL_KEYWORDS: &[&str] = &["warmup"];

/// Single-pass accumulator over a transcript's lines.
///
/// Identity fields are first-wins, `last_activity` and `model` are last-wins.
#[derive(Debug, Clone, Default)]
pub struct TranscriptFold {
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub slug: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub message_count: usize,
    pub tool_calls: usize,
    pub model: Option<String>,
    pub first_user_message: Option<String>,
    pub line_count: usize,
}

impl TranscriptFold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold raw lines, counting every non-empty line and parsing the rest.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut fold = Self::new();
        for line in lines {
            fold.line_count += 1;
            if let Some(entry) = parse_line(line.as_ref()) {
                fold.push(&entry);
            }
        }
        fold
    }

    pub fn push(&mut self, entry: &TranscriptEntry) {
        let Some(line) = entry.conversation() else {
            return;
        };

        if self.session_id.is_none() {
            self.session_id = Some(line.session_id.clone());
        }
        if self.agent_id.is_none() {
            self.agent_id = line.agent_id.clone();
        }
        if self.slug.is_none() {
            self.slug = line.slug.clone();
        }
        if self.start_time.is_none() {
            self.start_time = Some(line.timestamp);
        }
        self.last_activity = Some(line.timestamp);
        self.message_count += 1;

        match entry {
            TranscriptEntry::User(_) => {
                if self.first_user_message.is_none() {
                    self.first_user_message = line
                        .message
                        .as_ref()
                        .and_then(|m| m.content.text())
                        .filter(|t| !t.is_empty())
                        .map(String::from);
                }
            }
            TranscriptEntry::Assistant(_) => {
                if let Some(model) = line.model() {
                    self.model = Some(model.to_string());
                }
                self.tool_calls += line
                    .blocks()
                    .iter()
                    .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
                    .count();
            }
            TranscriptEntry::Other => {}
        }
    }

    pub fn normalized_model(&self) -> Option<String> {
        self.model.as_deref().map(normalize_model_name)
    }
}

/// Active if the file was modified within `window` of `now`.
pub fn infer_status(mtime: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> SessionStatus {
    if mtime > now - window {
        SessionStatus::Active
    } else {
        SessionStatus::Completed
    }
}

/// Classify an agent by keywords in its first user message.
///
/// Categories are tested in a fixed order (explore, plan, code-review,
/// general) and the first match wins.
pub fn infer_agent_type(first_message: &str) -> AgentType {
    let lower = first_message.to_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if matches_any(EXPLORE_KEYWORDS) {
        AgentType::Explore
    } else if matches_any(PLAN_KEYWORDS) {
        AgentType::Plan
    } else if matches_any(REVIEW_KEYWORDS) {
        AgentType::CodeReview
    } else if matches_any(GENERAL_KEYWORDS) {
        AgentType::General
    } else {
        AgentType::Unknown
    }
}

/// `greedy-juggling-valley` becomes `Greedy Juggling Valley`.
pub fn format_slug_as_name(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Summarize an agent sub-transcript. `None` when no line carries an agent id.
pub fn summarize_agent<S: AsRef<str>>(
    lines: &[S],
    file: &FileEntry,
    now: DateTime<Utc>,
    active_window: Duration,
) -> Option<AgentSummary> {
    let fold = TranscriptFold::from_lines(lines);
    let agent_id = fold.agent_id.clone()?;

    let name = match fold.slug.as_deref() {
        Some(slug) if !slug.is_empty() => format_slug_as_name(slug),
        _ => format!("Agent {}", agent_id.chars().take(8).collect::<String>()),
    };
    let first_message = fold.first_user_message.as_deref().unwrap_or_default();

    Some(AgentSummary {
        agent_type: infer_agent_type(first_message),
        first_message: fold
            .first_user_message
            .as_deref()
            .map(|m| m.chars().take(FIRST_MESSAGE_CHARS).collect()),
        agent_id,
        session_id: fold.session_id.clone().unwrap_or_default(),
        name,
        model: fold
            .normalized_model()
            .unwrap_or_else(|| "unknown".to_string()),
        status: infer_status(file.mtime, now, active_window),
        message_count: fold.message_count,
        tool_calls: fold.tool_calls,
        start_time: fold.start_time,
        last_activity: fold.last_activity,
        project_path: file.project(),
        file_path: file.path.clone(),
    })
}

/// Summarize any transcript. `None` when no line carries a session id.
pub fn summarize_session<S: AsRef<str>>(
    lines: &[S],
    file: &FileEntry,
    now: DateTime<Utc>,
    active_window: Duration,
) -> Option<ActiveSession> {
    let fold = TranscriptFold::from_lines(lines);
    let session_id = fold.session_id.clone()?;

    Some(ActiveSession {
        session_id,
        file_path: file.path.clone(),
        last_modified: file.mtime,
        project_path: file.project(),
        event_count: fold.line_count,
        model: fold.normalized_model(),
        is_agent: file.is_agent() || fold.agent_id.is_some(),
        status: infer_status(file.mtime, now, active_window),
        slug: fold.slug,
        message_count: fold.message_count,
        tool_calls: fold.tool_calls,
        start_time: fold.start_time,
        last_activity: fold.last_activity,
    })
}
