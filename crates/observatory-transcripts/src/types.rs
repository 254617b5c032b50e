use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================
// Raw transcript records (one per JSONL line)
// ============================================================

/// A single line of an assistant transcript, discriminated by `type`.
///
/// Only conversation turns carry data this crate cares about. Summaries,
/// file snapshots, system notices and any kind added later collapse into
/// [`TranscriptEntry::Other`] and are dropped by every consumer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    User(ConversationEntry),
    Assistant(ConversationEntry),
    #[serde(other)]
    Other,
}

impl TranscriptEntry {
    /// The conversation payload for user and assistant lines.
    pub fn conversation(&self) -> Option<&ConversationEntry> {
        match self {
            TranscriptEntry::User(line) | TranscriptEntry::Assistant(line) => Some(line),
            TranscriptEntry::Other => None,
        }
    }
}

/// Fields shared by user and assistant lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub uuid: String,
    /// Forms a tree over the file. Lines are processed in file order regardless.
    #[serde(default)]
    pub parent_uuid: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    /// Present on every line of an agent sub-transcript, absent otherwise.
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub is_sidechain: Option<bool>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub tool_use_result: Option<ToolUseResult>,
}

impl ConversationEntry {
    pub fn model(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.model.as_deref())
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        match self.message.as_ref().map(|m| &m.content) {
            Some(MessageContent::Blocks(blocks)) => blocks,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: Option<String>,
    /// Only on assistant lines. May change mid-file after a model switch.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// `message.content` is either plain text or an ordered list of blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(#[serde(deserialize_with = "lenient_blocks")] Vec<ContentBlock>),
}

/// Decodes each block on its own so one malformed block only loses itself.
fn lenient_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|block| serde_json::from_value(block).ok())
        .collect())
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Blocks(Vec::new())
    }
}

impl MessageContent {
    /// Plain string content, or the first text block of a block list.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text.as_str()),
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Option<Map<String, Value>>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: Value,
    },
    /// Images, redacted thinking and future block kinds.
    #[serde(other)]
    Unknown,
}

/// Token counters attached to an assistant turn.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
}

/// `toolUseResult` on a user line. Structured for file reads, but the
/// assistant also writes bare strings (errors) and arrays here.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ToolUseResult {
    Record(ToolUseRecord),
    Raw(Value),
}

impl ToolUseResult {
    pub fn file(&self) -> Option<&ToolFile> {
        match self {
            ToolUseResult::Record(record) => record.file.as_ref(),
            ToolUseResult::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolUseRecord {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub file: Option<ToolFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFile {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// ============================================================
// Derived views
// ============================================================

/// The display-ready unit consumed by the live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub is_agent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl ParsedEvent {
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EventPayload {
    Thinking {
        thinking: String,
    },
    ToolCall {
        tool_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_input: Option<Map<String, Value>>,
    },
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_result: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
    },
    Response {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_tokens: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_tokens: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_read: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_write: Option<u64>,
    },
    UserMessage {
        text: String,
    },
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Thinking { .. } => "thinking",
            EventPayload::ToolCall { .. } => "tool_call",
            EventPayload::ToolResult { .. } => "tool_result",
            EventPayload::Response { .. } => "response",
            EventPayload::UserMessage { .. } => "user_message",
        }
    }
}

/// Liveness heuristic derived from file modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

/// Keyword-inferred purpose of an agent sub-transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    Explore,
    Plan,
    CodeReview,
    General,
    Unknown,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Explore => "explore",
            AgentType::Plan => "plan",
            AgentType::CodeReview => "code-review",
            AgentType::General => "general",
            AgentType::Unknown => "unknown",
        }
    }
}

/// Summary of one agent sub-transcript. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub agent_id: String,
    pub session_id: String,
    pub name: String,
    pub model: String,
    pub status: SessionStatus,
    pub message_count: usize,
    pub tool_calls: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub project_path: String,
    pub file_path: PathBuf,
    pub first_message: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
}

/// Summary of one recently-touched transcript file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub session_id: String,
    pub file_path: PathBuf,
    pub last_modified: DateTime<Utc>,
    pub project_path: String,
    pub event_count: usize,
    pub model: Option<String>,
    pub is_agent: bool,
    pub status: SessionStatus,
    pub slug: Option<String>,
    pub message_count: usize,
    pub tool_calls: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Aggregate counts over recent agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub by_model: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
}

/// The primary session and its most recent events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub session: Option<ActiveSession>,
    pub events: Vec<ParsedEvent>,
}
