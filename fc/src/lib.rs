//! FileChunk - split files into fixed-size chunks and merge them back
//!
//! A split run reads a source file and writes each byte range to its own
//! chunk file inside a timestamped group directory. A merge run concatenates
//! every file in a directory, in name order, into one output file.
//!
//! # Layout
//!
//! ```text
//! <dir>/
//! ├── movie.mkv
//! └── movie_1718000000/
//!     ├── movie-1.mkv
//!     ├── movie-2.mkv
//!     └── movie-3.mkv
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::num::NonZeroU64;
//! use std::path::Path;
//! use filechunk::{LocalFs, Merger, Splitter, SystemClock};
//!
//! let size_mb = NonZeroU64::new(3).unwrap();
//! let report = Splitter::new(LocalFs, SystemClock).split(Path::new("movie.mkv"), size_mb, None)?;
//! Merger::new(LocalFs).merge(&report.group_dir, Path::new("movie-copy.mkv"))?;
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod layout;
pub mod merger;
pub mod splitter;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::ChunkError;
pub use layout::{ChunkLayout, ChunkName, ChunkSpan};
pub use merger::{MergeReport, Merger};
pub use splitter::{ChunkRecord, SplitReport, Splitter};
pub use storage::{DirEntry, LocalFs, Storage};

/// Bytes per megabyte, the unit of the `--size` flag
pub const MB: u64 = 1024 * 1024;
