//! Turns transcript lines into live-feed events.
//!
//! Only assistant lines with block content and user lines carrying a
//! `toolUseResult` produce events. Chat text without tool activity is left
//! to [`replay_events`].

use crate::types::{
    ContentBlock, ConversationEntry, EventPayload, MessageContent, ParsedEvent, TranscriptEntry,
};

/// Maximum length, in characters, of a tool result excerpt.
pub const TOOL_RESULT_EXCERPT_CHARS: usize = 500;

/// Extract zero or more events from one line, in content-block order.
pub fn extract_events(entry: &TranscriptEntry) -> Vec<ParsedEvent> {
    match entry {
        TranscriptEntry::Assistant(line) => assistant_events(line),
        TranscriptEntry::User(line) => tool_result_event(line).into_iter().collect(),
        TranscriptEntry::Other => Vec::new(),
    }
}

/// Full event stream of a transcript for replay, including user chat turns.
pub fn replay_events(entries: &[TranscriptEntry]) -> Vec<ParsedEvent> {
    let mut events = Vec::new();
    for entry in entries {
        if let TranscriptEntry::User(line) = entry {
            if let Some(event) = user_message_event(line) {
                events.push(event);
            }
        }
        events.extend(extract_events(entry));
    }
    events
}

/// Hard cut at `max` characters. No ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn event(line: &ConversationEntry, id: String, payload: EventPayload) -> ParsedEvent {
    ParsedEvent {
        id,
        timestamp: line.timestamp,
        session_id: line.session_id.clone(),
        model: line.model().map(String::from),
        is_agent: line.agent_id.is_some(),
        agent_id: line.agent_id.clone(),
        payload,
    }
}

fn assistant_events(line: &ConversationEntry) -> Vec<ParsedEvent> {
    let Some(message) = &line.message else {
        return Vec::new();
    };
    let MessageContent::Blocks(blocks) = &message.content else {
        return Vec::new();
    };
    let usage = message.usage.unwrap_or_default();

    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Thinking { thinking } if !thinking.is_empty() => Some(event(
                line,
                format!("{}-thinking", line.uuid),
                EventPayload::Thinking {
                    thinking: thinking.clone(),
                },
            )),
            ContentBlock::Text { text } if !text.is_empty() => Some(event(
                line,
                format!("{}-text", line.uuid),
                EventPayload::Response {
                    text: text.clone(),
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                    cache_read: usage.cache_read_input_tokens,
                    cache_write: usage.cache_creation_input_tokens,
                },
            )),
            ContentBlock::ToolUse {
                id,
                name: Some(name),
                input,
            } if !name.is_empty() => Some(event(
                line,
                id.clone()
                    .unwrap_or_else(|| format!("{}-tool", line.uuid)),
                EventPayload::ToolCall {
                    tool_name: name.clone(),
                    tool_input: input.clone(),
                },
            )),
            _ => None,
        })
        .collect()
}

fn tool_result_event(line: &ConversationEntry) -> Option<ParsedEvent> {
    let result = line.tool_use_result.as_ref()?;
    let file = result.file();

    Some(event(
        line,
        format!("{}-result", line.uuid),
        EventPayload::ToolResult {
            tool_result: file
                .and_then(|f| f.content.as_deref())
                .map(|c| truncate_chars(c, TOOL_RESULT_EXCERPT_CHARS)),
            file_path: file.and_then(|f| f.file_path.clone()),
        },
    ))
}

fn user_message_event(line: &ConversationEntry) -> Option<ParsedEvent> {
    if line.tool_use_result.is_some() {
        return None;
    }
    let text = line.message.as_ref()?.content.text()?;
    if text.is_empty() {
        return None;
    }

    Some(event(
        line,
        format!("{}-user", line.uuid),
        EventPayload::UserMessage {
            text: text.to_string(),
        },
    ))
}
