use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Transcript not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TranscriptError {
    pub(crate) fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            TranscriptError::NotFound(path.to_path_buf())
        } else {
            TranscriptError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
