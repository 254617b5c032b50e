use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

/// A transcript file and its modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub mtime: DateTime<Utc>,
}

impl FileEntry {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Name of the containing project directory.
    pub fn project(&self) -> String {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    pub fn is_agent(&self) -> bool {
        is_agent_transcript(self.file_name())
    }
}

/// Matches any transcript, including agent sub-transcripts.
pub fn is_transcript(name: &str) -> bool {
    name.ends_with(".jsonl")
}

/// Matches agent sub-transcripts (`agent-<id>.jsonl`).
pub fn is_agent_transcript(name: &str) -> bool {
    name.starts_with("agent-") && name.ends_with(".jsonl")
}

/// Immediate subdirectories of `root`. A missing root yields nothing.
pub fn find_containers(root: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot list {:?}: {}", root, e);
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs
}

/// Files under every container of `root` whose name satisfies `predicate`
/// and whose mtime falls within `window` of `now`, newest first.
pub fn find_recent_files<F>(
    root: &Path,
    predicate: F,
    window: Duration,
    now: DateTime<Utc>,
) -> Vec<FileEntry>
where
    F: Fn(&str) -> bool,
{
    find_recent_files_in(&find_containers(root), predicate, window, now)
}

/// Same as [`find_recent_files`] over an explicit container list. A container
/// that cannot be read contributes zero files.
pub fn find_recent_files_in<F>(
    containers: &[PathBuf],
    predicate: F,
    window: Duration,
    now: DateTime<Utc>,
) -> Vec<FileEntry>
where
    F: Fn(&str) -> bool,
{
    let cutoff = now - window;
    let mut files: Vec<FileEntry> = Vec::new();

    for dir in containers {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping inaccessible directory {:?}: {}", dir, e);
                continue;
            }
        };

        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !predicate(name) {
                continue;
            }

            let metadata = match fs::metadata(entry.path()) {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("Cannot stat {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };

            let mtime: DateTime<Utc> = modified.into();
            if mtime > cutoff {
                files.push(FileEntry {
                    path: entry.path(),
                    mtime,
                });
            }
        }
    }

    files.sort_by(|a, b| b.mtime.cmp(&a.mtime));
    files
}
