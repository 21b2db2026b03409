//! Split a file into fixed-size chunk files

use serde::Serialize;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::MB;
use crate::clock::Clock;
use crate::error::ChunkError;
use crate::layout::{ChunkLayout, ChunkName, ChunkSpan};
use crate::storage::Storage;

/// One chunk written by a split run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    /// One-based chunk number, as used in the file name
    pub number: u64,
    pub path: PathBuf,
    pub start: u64,
    pub end: u64,
}

impl ChunkRecord {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// Outcome of a successful split run
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub group_dir: PathBuf,
    pub file_size: u64,
    pub chunk_bytes: u64,
    pub chunks: Vec<ChunkRecord>,
}

/// What a run has put on disk so far, for rollback
#[derive(Debug, Default)]
struct Created {
    files: Vec<PathBuf>,
    group_dir: Option<PathBuf>,
}

/// Splits files into `<base>-<n><ext>` chunks under `<base>_<timestamp>/`
pub struct Splitter<S, C> {
    storage: S,
    clock: C,
}

impl<S: Storage, C: Clock> Splitter<S, C> {
    pub fn new(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    /// Split `source` into chunks of `chunk_size_mb` megabytes
    ///
    /// The group directory is created next to the source file, or under
    /// `output_dir` when given. If any chunk fails, every chunk written by
    /// this run is removed before the error is returned.
    pub fn split(
        &self,
        source: &Path,
        chunk_size_mb: NonZeroU64,
        output_dir: Option<&Path>,
    ) -> Result<SplitReport, ChunkError> {
        let chunk_bytes = chunk_size_mb.get().saturating_mul(MB);
        self.split_bytes(source, chunk_bytes, output_dir)
    }

    pub(crate) fn split_bytes(&self, source: &Path, chunk_bytes: u64, output_dir: Option<&Path>) -> Result<SplitReport, ChunkError> {
        let name = ChunkName::from_path(source).ok_or_else(|| ChunkError::Open {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;

        let mut reader = self.storage.open(source).map_err(|e| ChunkError::Open {
            path: source.to_path_buf(),
            source: e,
        })?;

        let file_size = self.storage.file_size(source).map_err(|e| ChunkError::Stat {
            path: source.to_path_buf(),
            source: e,
        })?;

        let layout = ChunkLayout::new(file_size, chunk_bytes).ok_or_else(|| ChunkError::Stat {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "chunk size must be non-zero"),
        })?;

        let parent = output_dir.or_else(|| source.parent()).unwrap_or(Path::new(""));
        let group_dir = parent.join(name.group_dir_name(self.clock.now_secs()));
        debug!(?source, file_size, chunk_bytes, chunk_count = layout.count(), ?group_dir, "Splitter::split: starting");

        let mut created = Created::default();
        let mut chunks = Vec::with_capacity(layout.count() as usize);

        for span in layout.spans() {
            match self.write_chunk(&mut reader, source, &group_dir, &name, span, &mut created) {
                Ok(record) => {
                    debug!(path = ?record.path, size = record.size(), "Splitter::split: chunk written");
                    chunks.push(record);
                }
                Err(e) => {
                    warn!(%e, chunk = span.number(), "Chunk failed, rolling back split run");
                    return Err(self.rollback(created, e));
                }
            }
        }

        info!(?source, ?group_dir, chunk_count = chunks.len(), "Split complete");
        Ok(SplitReport {
            source: source.to_path_buf(),
            group_dir,
            file_size,
            chunk_bytes,
            chunks,
        })
    }

    fn write_chunk(
        &self,
        reader: &mut S::Reader,
        source: &Path,
        group_dir: &Path,
        name: &ChunkName,
        span: ChunkSpan,
        created: &mut Created,
    ) -> Result<ChunkRecord, ChunkError> {
        if created.group_dir.is_none() && !self.storage.exists(group_dir) {
            self.storage.create_dir_all(group_dir).map_err(|e| ChunkError::CreateDir {
                path: group_dir.to_path_buf(),
                source: e,
            })?;
            created.group_dir = Some(group_dir.to_path_buf());
        }

        let path = group_dir.join(name.chunk_file_name(span.number()));
        let mut writer = self.storage.create(&path).map_err(|e| ChunkError::Create {
            path: path.clone(),
            source: e,
        })?;
        created.files.push(path.clone());

        reader.seek(SeekFrom::Start(span.start)).map_err(|e| ChunkError::Seek {
            path: source.to_path_buf(),
            offset: span.start,
            source: e,
        })?;

        let copied = io::copy(&mut reader.by_ref().take(span.len()), &mut writer).map_err(|e| ChunkError::Copy {
            path: path.clone(),
            source: e,
        })?;
        if copied != span.len() {
            return Err(ChunkError::ShortCopy {
                path,
                expected: span.len(),
                copied,
            });
        }

        writer.flush().map_err(|e| ChunkError::Copy {
            path: path.clone(),
            source: e,
        })?;

        Ok(ChunkRecord {
            number: span.number(),
            path,
            start: span.start,
            end: span.end,
        })
    }

    /// Remove everything this run created; returns the error to surface
    fn rollback(&self, created: Created, cause: ChunkError) -> ChunkError {
        let mut leftover = Vec::new();

        for path in created.files.iter().rev() {
            match self.storage.remove_file(path) {
                Ok(()) => debug!(?path, "Splitter::rollback: removed chunk"),
                Err(e) => {
                    warn!(?path, %e, "Failed to remove chunk during rollback");
                    leftover.push(path.clone());
                }
            }
        }

        if let Some(dir) = created.group_dir
            && let Err(e) = self.storage.remove_dir(&dir)
        {
            warn!(?dir, %e, "Failed to remove group directory during rollback");
            leftover.push(dir);
        }

        if leftover.is_empty() {
            info!(removed = created.files.len(), "Rolled back split run");
            cause
        } else {
            ChunkError::Rollback {
                leftover,
                cause: Box::new(cause),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{DirEntry, LocalFs};
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    const TS: i64 = 1_718_000_000;

    fn mb(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// LocalFs with injectable failures
    #[derive(Default)]
    struct FaultyFs {
        /// Fail the create call with this zero-based ordinal
        fail_create_at: Option<usize>,
        /// Hand out a writer that fails for the create call with this ordinal
        fail_write_at: Option<usize>,
        /// Refuse to remove files whose name matches
        pin_file: Option<String>,
        /// Report this many bytes more than the file holds
        overstate_size: u64,
        creates: Cell<usize>,
    }

    enum FaultyWriter {
        Real(fs::File),
        Broken,
    }

    impl Write for FaultyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match self {
                FaultyWriter::Real(f) => f.write(buf),
                FaultyWriter::Broken => Err(io::Error::other("device unplugged")),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            match self {
                FaultyWriter::Real(f) => f.flush(),
                FaultyWriter::Broken => Ok(()),
            }
        }
    }

    impl Storage for FaultyFs {
        type Reader = fs::File;
        type Writer = FaultyWriter;

        fn open(&self, path: &Path) -> io::Result<fs::File> {
            LocalFs.open(path)
        }

        fn file_size(&self, path: &Path) -> io::Result<u64> {
            Ok(LocalFs.file_size(path)? + self.overstate_size)
        }

        fn create(&self, path: &Path) -> io::Result<FaultyWriter> {
            let n = self.creates.get();
            self.creates.set(n + 1);
            if self.fail_create_at == Some(n) {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"));
            }
            let file = LocalFs.create(path)?;
            if self.fail_write_at == Some(n) {
                return Ok(FaultyWriter::Broken);
            }
            Ok(FaultyWriter::Real(file))
        }

        fn exists(&self, path: &Path) -> bool {
            LocalFs.exists(path)
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            LocalFs.create_dir_all(path)
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            let name = path.file_name().map(|n| n.to_string_lossy().to_string());
            if name.is_some() && name == self.pin_file {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "pinned"));
            }
            LocalFs.remove_file(path)
        }

        fn remove_dir(&self, path: &Path) -> io::Result<()> {
            LocalFs.remove_dir(path)
        }

        fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
            LocalFs.list_dir(path)
        }

        fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
            LocalFs.canonicalize(path)
        }
    }

    #[test]
    fn test_split_ten_mb_into_three_mb_chunks() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("movie.mkv");
        let data = patterned(10 * MB as usize);
        fs::write(&source, &data).unwrap();

        let splitter = Splitter::new(LocalFs, FixedClock(TS));
        let report = splitter.split(&source, mb(3), None).unwrap();

        assert_eq!(report.group_dir, temp.path().join("movie_1718000000"));
        let sizes: Vec<u64> = report.chunks.iter().map(|c| c.size()).collect();
        assert_eq!(sizes, vec![3 * MB, 3 * MB, 3 * MB, MB]);

        let mut rebuilt = Vec::new();
        for (i, chunk) in report.chunks.iter().enumerate() {
            assert_eq!(chunk.path, report.group_dir.join(format!("movie-{}.mkv", i + 1)));
            rebuilt.extend(fs::read(&chunk.path).unwrap());
        }
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn test_split_small_file_single_chunk() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("notes.txt");
        fs::write(&source, "hello chunks").unwrap();

        let report = Splitter::new(LocalFs, FixedClock(TS)).split(&source, mb(1), None).unwrap();

        assert_eq!(report.chunks.len(), 1);
        let chunk = fs::read_to_string(&report.chunks[0].path).unwrap();
        assert_eq!(chunk, "hello chunks");
    }

    #[test]
    fn test_split_empty_file_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("empty.bin");
        fs::write(&source, "").unwrap();

        let report = Splitter::new(LocalFs, FixedClock(TS)).split(&source, mb(1), None).unwrap();

        assert!(report.chunks.is_empty());
        assert!(!report.group_dir.exists());
    }

    #[test]
    fn test_split_into_output_dir() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data.bin");
        fs::write(&source, patterned(1000)).unwrap();
        let out = temp.path().join("out");

        let report = Splitter::new(LocalFs, FixedClock(TS))
            .split_bytes(&source, 300, Some(&out))
            .unwrap();

        assert_eq!(report.group_dir, out.join("data_1718000000"));
        assert_eq!(report.chunks.len(), 4);
        assert_eq!(report.chunks[3].size(), 100);
        assert!(out.join("data_1718000000").join("data-4.bin").exists());
    }

    #[test]
    fn test_split_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = Splitter::new(LocalFs, FixedClock(TS))
            .split(&temp.path().join("nope.bin"), mb(1), None)
            .unwrap_err();

        assert!(matches!(err, ChunkError::Open { .. }));
    }

    #[test]
    fn test_failed_create_rolls_back_previous_chunks() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data.bin");
        fs::write(&source, patterned(1000)).unwrap();

        let storage = FaultyFs {
            fail_create_at: Some(2),
            ..Default::default()
        };
        let err = Splitter::new(storage, FixedClock(TS))
            .split_bytes(&source, 300, None)
            .unwrap_err();

        assert!(matches!(err, ChunkError::Create { .. }));
        let group_dir = temp.path().join("data_1718000000");
        assert!(!group_dir.join("data-1.bin").exists());
        assert!(!group_dir.join("data-2.bin").exists());
        assert!(!group_dir.exists());
    }

    #[test]
    fn test_failed_write_removes_partial_chunk() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data.bin");
        fs::write(&source, patterned(1000)).unwrap();

        let storage = FaultyFs {
            fail_write_at: Some(1),
            ..Default::default()
        };
        let splitter = Splitter::new(storage, FixedClock(TS));
        let err = splitter.split_bytes(&source, 300, None).unwrap_err();

        assert!(matches!(err, ChunkError::Copy { .. }));
        assert!(!temp.path().join("data_1718000000").exists());
        // chunks past the failure are never attempted
        assert_eq!(splitter.storage.creates.get(), 2);
    }

    #[test]
    fn test_source_shorter_than_stat_rolls_back() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data.bin");
        fs::write(&source, patterned(1000)).unwrap();

        let storage = FaultyFs {
            overstate_size: 500,
            ..Default::default()
        };
        let err = Splitter::new(storage, FixedClock(TS))
            .split_bytes(&source, 300, None)
            .unwrap_err();

        let group_dir = temp.path().join("data_1718000000");
        match err {
            ChunkError::ShortCopy { path, expected, copied } => {
                assert_eq!(path, group_dir.join("data-4.bin"));
                assert_eq!(expected, 300);
                assert_eq!(copied, 100);
            }
            other => panic!("expected short copy, got {other:?}"),
        }
        assert!(!group_dir.exists());
    }

    #[test]
    fn test_split_dotfile_names() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join(".bashrc");
        fs::write(&source, patterned(500)).unwrap();

        let report = Splitter::new(LocalFs, FixedClock(TS))
            .split_bytes(&source, 300, None)
            .unwrap();

        assert_eq!(report.group_dir, temp.path().join("_1718000000"));
        assert_eq!(report.chunks[0].path, report.group_dir.join("-1.bashrc"));
        assert_eq!(report.chunks[1].path, report.group_dir.join("-2.bashrc"));
    }

    #[test]
    fn test_rollback_keeps_existing_group_dir() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data.bin");
        fs::write(&source, patterned(1000)).unwrap();
        let group_dir = temp.path().join("data_1718000000");
        fs::create_dir(&group_dir).unwrap();
        fs::write(group_dir.join("keep.txt"), "mine").unwrap();

        let storage = FaultyFs {
            fail_create_at: Some(1),
            ..Default::default()
        };
        Splitter::new(storage, FixedClock(TS))
            .split_bytes(&source, 300, None)
            .unwrap_err();

        assert!(group_dir.join("keep.txt").exists());
        assert!(!group_dir.join("data-1.bin").exists());
    }

    #[test]
    fn test_rollback_failure_reports_leftovers() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data.bin");
        fs::write(&source, patterned(1000)).unwrap();

        let storage = FaultyFs {
            fail_create_at: Some(3),
            pin_file: Some("data-2.bin".to_string()),
            ..Default::default()
        };
        let err = Splitter::new(storage, FixedClock(TS))
            .split_bytes(&source, 300, None)
            .unwrap_err();

        let group_dir = temp.path().join("data_1718000000");
        match err {
            ChunkError::Rollback { leftover, cause } => {
                assert!(leftover.contains(&group_dir.join("data-2.bin")));
                assert!(leftover.contains(&group_dir));
                assert!(matches!(*cause, ChunkError::Create { .. }));
            }
            other => panic!("expected rollback error, got {other:?}"),
        }
        assert!(!group_dir.join("data-1.bin").exists());
        assert!(!group_dir.join("data-3.bin").exists());
        assert!(group_dir.join("data-2.bin").exists());
    }
}
