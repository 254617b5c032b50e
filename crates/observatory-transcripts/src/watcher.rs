use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::discovery::{is_agent_transcript, is_transcript};

/// Emitted when a transcript file changes. Consumers re-query the store;
/// the change itself carries no transcript content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TranscriptChange {
    TranscriptCreated {
        path: PathBuf,
        project: String,
        is_agent: bool,
    },
    TranscriptUpdated {
        path: PathBuf,
        project: String,
        is_agent: bool,
    },
}

impl TranscriptChange {
    pub fn name(&self) -> &'static str {
        match self {
            TranscriptChange::TranscriptCreated { .. } => "transcript_created",
            TranscriptChange::TranscriptUpdated { .. } => "transcript_updated",
        }
    }
}

/// Watches the projects directory and broadcasts [`TranscriptChange`]s.
pub struct TranscriptWatcher {
    tx: broadcast::Sender<TranscriptChange>,
    _watcher: Option<RecommendedWatcher>,
}

impl TranscriptWatcher {
    /// Watch `projects_dir` recursively. Fails if the directory is missing.
    pub fn with_dir(projects_dir: &Path) -> Result<Self> {
        let (tx, _) = broadcast::channel(256);
        let tx_clone = tx.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                for change in classify(&event) {
                    let _ = tx_clone.send(change);
                }
            }
        })?;

        watcher.watch(projects_dir, RecursiveMode::Recursive)?;

        Ok(Self {
            tx,
            _watcher: Some(watcher),
        })
    }

    /// A watcher that never emits. Subscribers simply wait.
    pub fn disabled() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, _watcher: None }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptChange> {
        self.tx.subscribe()
    }
}

fn classify(event: &Event) -> Vec<TranscriptChange> {
    event
        .paths
        .iter()
        .filter_map(|path| {
            let name = path.file_name().and_then(|s| s.to_str())?;
            if !is_transcript(name) {
                return None;
            }

            let project = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            let is_agent = is_agent_transcript(name);
            let path = path.clone();

            match event.kind {
                EventKind::Create(_) => Some(TranscriptChange::TranscriptCreated {
                    path,
                    project,
                    is_agent,
                }),
                EventKind::Modify(_) => Some(TranscriptChange::TranscriptUpdated {
                    path,
                    project,
                    is_agent,
                }),
                _ => None,
            }
        })
        .collect()
}
