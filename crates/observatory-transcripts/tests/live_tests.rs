use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use observatory_transcripts::discovery::{find_recent_files, find_recent_files_in, is_transcript};
use observatory_transcripts::{EventPayload, SessionStatus, TranscriptStore};
use tempfile::TempDir;

const SESSION_A: &str = r#"{"type":"user","uuid":"u1","parentUuid":null,"timestamp":"2026-01-20T10:00:00Z","sessionId":"sess-a","slug":"brave-purple-otter","message":{"role":"user","content":"fix the login bug"}}
{"type":"assistant","uuid":"a1","parentUuid":"u1","timestamp":"2026-01-20T10:00:05Z","sessionId":"sess-a","message":{"role":"assistant","model":"claude-sonnet-4-5-20250929","content":[{"type":"thinking","thinking":"T1"},{"type":"text","text":"Looking"},{"type":"tool_use","id":"tu1","name":"Read","input":{"file_path":"/src/login.rs"}}],"usage":{"input_tokens":120,"output_tokens":40,"cache_read_input_tokens":900}}}
{"type":"user","uuid":"r1","parentUuid":"a1","timestamp":"2026-01-20T10:00:06Z","sessionId":"sess-a","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"tu1","content":"fn login() {}"}]},"toolUseResult":{"type":"text","file":{"filePath":"/src/login.rs","content":"fn login() {}"}}}
{"type":"assistant","uuid":"a2","parentUuid":"r1","timestamp":"2026-01-20T10:00:10Z","sessionId":"sess-a","message":{"role":"assistant","model":"claude-sonnet-4-5-20250929","content":[{"type":"text","text":"Fixed it"},{"type":"tool_use","id":"tu2","name":"Edit","input":{}}]}}
{"type":"assistant","uuid":"a3","timest"#;

const AGENT_A: &str = r#"{"type":"user","uuid":"g1","timestamp":"2026-01-20T10:00:07Z","sessionId":"sess-a","agentId":"agent0001xyz","isSidechain":true,"message":{"role":"user","content":"Explore the auth module"}}
{"type":"assistant","uuid":"g2","timestamp":"2026-01-20T10:00:08Z","sessionId":"sess-a","agentId":"agent0001xyz","isSidechain":true,"message":{"role":"assistant","model":"claude-haiku-4-5-20251001","content":[{"type":"tool_use","id":"tu9","name":"Grep","input":{"pattern":"auth"}}]}}"#;

const SESSION_B: &str = r#"{"type":"summary","summary":"Earlier work","leafUuid":"x"}
{"type":"assistant","uuid":"b1","timestamp":"2026-01-20T09:30:00Z","sessionId":"sess-b","message":{"role":"assistant","model":"claude-opus-4-5-20251101","content":[{"type":"text","text":"hello from b"}]}}"#;

const SESSION_OLD: &str = r#"{"type":"assistant","uuid":"o1","timestamp":"2026-01-19T08:00:00Z","sessionId":"sess-old","message":{"content":[{"type":"text","text":"ancient"}]}}"#;

/// Write a transcript and backdate its modification time.
fn write_transcript(dir: &Path, name: &str, content: &str, age_minutes: u64) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();

    let mtime = SystemTime::now() - Duration::from_secs(age_minutes * 60);
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
    path
}

/// Helper: a projects directory with two projects and one agent transcript.
fn create_projects_dir() -> TempDir {
    let root = TempDir::new().unwrap();
    let alpha = root.path().join("-home-user-alpha");
    let beta = root.path().join("-home-user-beta");

    write_transcript(&alpha, "sess-a.jsonl", SESSION_A, 1);
    write_transcript(&alpha, "agent-agent0001xyz.jsonl", AGENT_A, 2);
    write_transcript(&beta, "sess-b.jsonl", SESSION_B, 20);
    write_transcript(&beta, "sess-old.jsonl", SESSION_OLD, 180);
    write_transcript(&beta, "notes.txt", "not a transcript", 1);

    root
}

fn event_ids(events: &[observatory_transcripts::ParsedEvent]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

// ============================================================
// Active sessions
// ============================================================

#[test]
fn test_active_sessions_newest_first() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let sessions = store.active_sessions();

    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0].session_id, "sess-a");
    assert!(!sessions[0].is_agent);
    assert_eq!(sessions[1].session_id, "sess-a");
    assert!(sessions[1].is_agent);
    assert_eq!(sessions[2].session_id, "sess-b");
}

#[test]
fn test_active_session_fields() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let sessions = store.active_sessions();
    let a = &sessions[0];

    assert_eq!(a.project_path, "-home-user-alpha");
    assert_eq!(a.event_count, 5);
    assert_eq!(a.message_count, 4);
    assert_eq!(a.tool_calls, 2);
    assert_eq!(a.model.as_deref(), Some("sonnet"));
    assert_eq!(a.slug.as_deref(), Some("brave-purple-otter"));
    assert_eq!(a.status, SessionStatus::Active);

    let b = &sessions[2];
    assert_eq!(b.model.as_deref(), Some("opus"));
    assert_eq!(b.status, SessionStatus::Completed);
}

#[test]
fn test_active_sessions_capped_at_ten() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("proj");
    for i in 0..12 {
        let content = format!(
            r#"{{"type":"user","uuid":"u{i}","timestamp":"2026-01-20T10:00:00Z","sessionId":"s{i}","message":{{"content":"hi"}}}}"#
        );
        write_transcript(&dir, &format!("s{i}.jsonl"), &content, i as u64 + 1);
    }

    let store = TranscriptStore::with_dir(root.path().to_path_buf());
    let sessions = store.active_sessions();

    assert_eq!(sessions.len(), 10);
    assert_eq!(sessions[0].session_id, "s0");
    assert_eq!(sessions[9].session_id, "s9");
}

// ============================================================
// Session events
// ============================================================

#[test]
fn test_session_events_most_recent_first() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let events = store.session_events("sess-a", 50);

    assert_eq!(
        event_ids(&events),
        vec!["tu2", "a2-text", "r1-result", "tu1", "a1-text", "a1-thinking"]
    );
    assert!(events.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[test]
fn test_session_events_respects_limit() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let events = store.session_events("sess-a", 2);
    assert_eq!(event_ids(&events), vec!["tu2", "a2-text"]);

    assert!(store.session_events("sess-a", 0).is_empty());
}

#[test]
fn test_session_events_carry_usage_and_results() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let events = store.session_events("sess-a", 50);

    let response = events.iter().find(|e| e.id == "a1-text").unwrap();
    assert_eq!(
        response.payload,
        EventPayload::Response {
            text: "Looking".to_string(),
            input_tokens: Some(120),
            output_tokens: Some(40),
            cache_read: Some(900),
            cache_write: None,
        }
    );

    let result = events.iter().find(|e| e.id == "r1-result").unwrap();
    assert_eq!(
        result.payload,
        EventPayload::ToolResult {
            tool_result: Some("fn login() {}".to_string()),
            file_path: Some("/src/login.rs".to_string()),
        }
    );
}

#[test]
fn test_session_events_matches_after_leading_summary_line() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let events = store.session_events("sess-b", 10);
    assert_eq!(event_ids(&events), vec!["b1-text"]);
}

#[test]
fn test_session_events_unknown_or_stale_session() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    assert!(store.session_events("no-such-session", 50).is_empty());
    // Older than the two-hour lookup window
    assert!(store.session_events("sess-old", 50).is_empty());
}

#[test]
fn test_replay_session_is_chronological_with_user_turns() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let events = store.replay_session("sess-a");
    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();

    assert_eq!(
        kinds,
        vec!["user_message", "thinking", "response", "tool_call", "tool_result", "response", "tool_call"]
    );
}

// ============================================================
// Live events and current session
// ============================================================

#[test]
fn test_live_events_merge_across_files() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let events = store.live_events(100);

    // 6 from sess-a, 1 from the agent, 1 from sess-b; sess-old is too old
    assert_eq!(events.len(), 8);
    assert!(events.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(events.last().unwrap().session_id, "sess-b");

    let agent_event = events.iter().find(|e| e.id == "tu9").unwrap();
    assert!(agent_event.is_agent);
    assert_eq!(agent_event.agent_id.as_deref(), Some("agent0001xyz"));
}

#[test]
fn test_live_events_limit() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let events = store.live_events(3);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].session_id, "sess-a");
}

#[test]
fn test_live_events_only_reads_file_tail() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("proj");

    let mut content = String::new();
    for i in 0..30 {
        content.push_str(&format!(
            r#"{{"type":"assistant","uuid":"m{i}","timestamp":"2026-01-20T10:00:{i:02}Z","sessionId":"s1","message":{{"content":[{{"type":"text","text":"t{i}"}}]}}}}"#
        ));
        content.push('\n');
    }
    write_transcript(&dir, "s1.jsonl", &content, 1);

    let store = TranscriptStore::with_dir(root.path().to_path_buf());
    let events = store.live_events(100);

    assert_eq!(events.len(), 20);
    assert_eq!(events[0].id, "m29-text");
    assert_eq!(events[19].id, "m10-text");
}

#[test]
fn test_current_session_prefers_non_agent() {
    let root = create_projects_dir();
    // An agent of another session becomes the newest file
    write_transcript(
        &root.path().join("-home-user-beta"),
        "agent-agent0002abc.jsonl",
        &AGENT_A
            .replace("sess-a", "sess-parent")
            .replace("agent0001xyz", "agent0002abc"),
        0,
    );
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let current = store.current_session(2);
    let session = current.session.unwrap();

    assert!(!session.is_agent);
    assert_eq!(session.session_id, "sess-a");
    assert_eq!(event_ids(&current.events), vec!["tu2", "a2-text"]);
}

#[test]
fn test_current_session_falls_back_to_agent() {
    let root = TempDir::new().unwrap();
    write_transcript(&root.path().join("proj"), "agent-agent0001xyz.jsonl", AGENT_A, 1);
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    let current = store.current_session(50);
    let session = current.session.unwrap();
    assert!(session.is_agent);
    assert_eq!(session.session_id, "sess-a");
}

// ============================================================
// Degraded inputs
// ============================================================

#[test]
fn test_missing_root_yields_empty_results() {
    let root = TempDir::new().unwrap();
    let store = TranscriptStore::with_dir(root.path().join("does-not-exist"));

    assert!(store.active_sessions().is_empty());
    assert!(store.session_events("sess-a", 50).is_empty());
    assert!(store.live_events(100).is_empty());
    assert!(store.replay_session("sess-a").is_empty());

    let current = store.current_session(50);
    assert!(current.session.is_none());
    assert!(current.events.is_empty());
}

#[test]
fn test_garbage_only_transcript_contributes_nothing() {
    let root = TempDir::new().unwrap();
    write_transcript(&root.path().join("proj"), "junk.jsonl", "not json\n{\"half\":", 1);
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    assert!(store.active_sessions().is_empty());
    assert!(store.live_events(100).is_empty());
}

#[test]
fn test_queries_are_idempotent() {
    let root = create_projects_dir();
    let store = TranscriptStore::with_dir(root.path().to_path_buf());

    assert_eq!(store.active_sessions(), store.active_sessions());
    assert_eq!(store.session_events("sess-a", 50), store.session_events("sess-a", 50));
    assert_eq!(store.live_events(100), store.live_events(100));
    assert_eq!(store.current_session(10), store.current_session(10));
}

#[test]
fn test_discovery_skips_vanished_container() {
    let root = create_projects_dir();
    let containers = vec![
        root.path().join("-home-user-gone"),
        root.path().join("-home-user-beta"),
    ];

    let files = find_recent_files_in(
        &containers,
        is_transcript,
        chrono::Duration::minutes(60),
        Utc::now(),
    );

    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("sess-b.jsonl"));
}

#[cfg(unix)]
#[test]
fn test_discovery_skips_unreadable_container() {
    use std::os::unix::fs::PermissionsExt;

    let root = create_projects_dir();
    let locked = root.path().join("-home-user-alpha");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not bind root
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let files = find_recent_files(
        root.path(),
        is_transcript,
        chrono::Duration::minutes(60),
        Utc::now(),
    );
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("sess-b.jsonl"));
}

#[cfg(unix)]
#[test]
fn test_symlinked_transcript_is_discovered() {
    let root = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let target = write_transcript(elsewhere.path(), "real.jsonl", SESSION_B, 5);

    let project = root.path().join("-home-user-linked");
    fs::create_dir_all(&project).unwrap();
    std::os::unix::fs::symlink(&target, project.join("s1.jsonl")).unwrap();

    let store = TranscriptStore::with_dir(root.path().to_path_buf());
    let sessions = store.active_sessions();

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "sess-b");
    assert!(sessions[0].file_path.ends_with("s1.jsonl"));
    assert_eq!(event_ids(&store.session_events("sess-b", 50)), vec!["b1-text"]);
}
