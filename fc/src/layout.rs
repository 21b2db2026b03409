//! Chunk boundary arithmetic and chunk file naming

use std::ffi::{OsStr, OsString};
use std::path::Path;

/// A contiguous byte range `[start, end)` of the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Zero-based chunk index
    pub index: u64,
    /// First byte offset (inclusive)
    pub start: u64,
    /// Last byte offset (exclusive)
    pub end: u64,
}

impl ChunkSpan {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// One-based number used in chunk file names
    pub fn number(&self) -> u64 {
        self.index + 1
    }
}

/// Fixed-size partitioning of a file into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    file_size: u64,
    chunk_bytes: u64,
}

impl ChunkLayout {
    /// Returns `None` when `chunk_bytes` is zero
    pub fn new(file_size: u64, chunk_bytes: u64) -> Option<Self> {
        if chunk_bytes == 0 {
            return None;
        }
        Some(Self { file_size, chunk_bytes })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_bytes(&self) -> u64 {
        self.chunk_bytes
    }

    /// Number of chunks, `ceil(file_size / chunk_bytes)`
    pub fn count(&self) -> u64 {
        self.file_size.div_ceil(self.chunk_bytes)
    }

    /// Span of the chunk at `index`, or `None` past the last chunk
    pub fn span(&self, index: u64) -> Option<ChunkSpan> {
        if index >= self.count() {
            return None;
        }
        let start = index * self.chunk_bytes;
        let end = start.saturating_add(self.chunk_bytes).min(self.file_size);
        Some(ChunkSpan { index, start, end })
    }

    pub fn spans(&self) -> impl Iterator<Item = ChunkSpan> + '_ {
        (0..self.count()).filter_map(move |i| self.span(i))
    }
}

/// Base name and extension of a source file, used to name chunks and groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkName {
    base: OsString,
    ext: OsString,
}

impl ChunkName {
    /// Split the final path component at its last `.`
    ///
    /// The extension runs from the last dot to the end, so a dotfile with no
    /// other dot (`.bashrc`) is all extension and has an empty base.
    /// Returns `None` for paths without a file name (`/`, `..`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?;
        let dotted = |e: &OsStr| {
            let mut ext = OsString::from(".");
            ext.push(e);
            ext
        };

        let stem = || path.file_stem().map(OsStr::to_os_string).unwrap_or_default();

        let (base, ext) = match path.extension() {
            Some(e) => (stem(), dotted(e)),
            None if file_name.as_encoded_bytes().starts_with(b".") => (OsString::new(), file_name.to_os_string()),
            None => (stem(), OsString::new()),
        };
        Some(Self { base, ext })
    }

    pub fn base(&self) -> &OsStr {
        &self.base
    }

    pub fn ext(&self) -> &OsStr {
        &self.ext
    }

    /// `<base>-<number><ext>`
    pub fn chunk_file_name(&self, number: u64) -> OsString {
        let mut name = self.base.clone();
        name.push(format!("-{}", number));
        name.push(&self.ext);
        name
    }

    /// `<base>_<timestamp>`
    pub fn group_dir_name(&self, timestamp: i64) -> OsString {
        let mut name = self.base.clone();
        name.push(format!("_{}", timestamp));
        name
    }
}
