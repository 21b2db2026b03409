//! Concatenate a directory of chunk files into one file

use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ChunkError;
use crate::storage::Storage;

/// Outcome of a successful merge
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub folder: PathBuf,
    pub merged: PathBuf,
    /// Files appended, in the order they were merged
    pub files: Vec<PathBuf>,
    pub bytes: u64,
}

/// Merges every regular file of a directory, in file name order
///
/// File names sort lexicographically, so `part-10` comes before `part-2`.
/// No attempt is made to restore numeric chunk order.
pub struct Merger<S> {
    storage: S,
}

impl<S: Storage> Merger<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Write the concatenation of the files in `folder` to `merged`
    ///
    /// The output is truncated first. On error the output is left as written
    /// so far.
    pub fn merge(&self, folder: &Path, merged: &Path) -> Result<MergeReport, ChunkError> {
        let mut out = self.storage.create(merged).map_err(|e| ChunkError::Create {
            path: merged.to_path_buf(),
            source: e,
        })?;
        let merged_canonical = self.storage.canonicalize(merged).ok();

        let entries = self.storage.list_dir(folder).map_err(|e| ChunkError::ReadDir {
            path: folder.to_path_buf(),
            source: e,
        })?;

        let mut files = Vec::new();
        let mut bytes = 0u64;

        for entry in entries {
            if entry.is_dir {
                debug!(path = ?entry.path, "Merger::merge: skipping directory");
                continue;
            }
            if merged_canonical.is_some() && self.storage.canonicalize(&entry.path).ok() == merged_canonical {
                debug!(path = ?entry.path, "Merger::merge: skipping output file");
                continue;
            }

            let mut chunk = self.storage.open(&entry.path).map_err(|e| ChunkError::Open {
                path: entry.path.clone(),
                source: e,
            })?;
            let copied = io::copy(&mut chunk, &mut out).map_err(|e| ChunkError::Append {
                chunk: entry.path.clone(),
                path: merged.to_path_buf(),
                source: e,
            })?;

            debug!(path = ?entry.path, copied, "Merger::merge: file appended");
            bytes += copied;
            files.push(entry.path);
        }

        out.flush().map_err(|e| ChunkError::Copy {
            path: merged.to_path_buf(),
            source: e,
        })?;

        info!(?folder, ?merged, file_count = files.len(), bytes, "Merge complete");
        Ok(MergeReport {
            folder: folder.to_path_buf(),
            merged: merged.to_path_buf(),
            files,
            bytes,
        })
    }
}
