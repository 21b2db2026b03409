//! Filesystem access used by the splitter and merger

use std::fs;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A directory entry as seen by the merger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// File operations needed to split and merge
///
/// All methods return plain I/O errors; callers attach the path and
/// operation.
pub trait Storage {
    type Reader: Read + Seek;
    type Writer: Write;

    /// Open an existing file for reading
    fn open(&self, path: &Path) -> io::Result<Self::Reader>;

    /// Size of a file in bytes
    fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Create a file, truncating it if it exists
    fn create(&self, path: &Path) -> io::Result<Self::Writer>;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Entries of a directory, sorted by file name
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Resolve a path to its absolute, symlink-free form
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Storage backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Storage for LocalFs {
    type Reader = fs::File;
    type Writer = fs::File;

    fn open(&self, path: &Path) -> io::Result<fs::File> {
        fs::File::open(path)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn create(&self, path: &Path) -> io::Result<fs::File> {
        fs::File::create(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            entries.push(DirEntry {
                path: entry.path(),
                is_dir,
            });
        }

        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        debug!(?path, count = entries.len(), "LocalFs::list_dir: entries collected");
        Ok(entries)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}
