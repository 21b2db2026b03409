//! Split and merge error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while splitting or merging
///
/// Every variant keeps the underlying `io::Error` as its source so callers see
/// the original failure unchanged.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("Failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stat {path}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to seek {path} to offset {offset}")]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy into {path}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append {chunk} to {path}")]
    Append {
        chunk: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Short copy into {path}: expected {expected} bytes, copied {copied}")]
    ShortCopy { path: PathBuf, expected: u64, copied: u64 },

    #[error("Failed to remove {path}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rollback left {} file(s) behind", .leftover.len())]
    Rollback {
        leftover: Vec<PathBuf>,
        #[source]
        cause: Box<ChunkError>,
    },
}

impl ChunkError {
    /// Path the failing operation was acting on
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ChunkError::Append { chunk, .. } => Some(chunk),
            ChunkError::Open { path, .. }
            | ChunkError::Stat { path, .. }
            | ChunkError::Seek { path, .. }
            | ChunkError::Create { path, .. }
            | ChunkError::CreateDir { path, .. }
            | ChunkError::ReadDir { path, .. }
            | ChunkError::Copy { path, .. }
            | ChunkError::ShortCopy { path, .. }
            | ChunkError::Remove { path, .. } => Some(path),
            ChunkError::Rollback { cause, .. } => cause.path(),
        }
    }
}
