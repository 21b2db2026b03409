//! CLI argument parsing for fchunk

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::num::NonZeroU64;
use std::path::PathBuf;

use crate::config::Config;

/// Long flag names that may also be spelled with a single dash (`-size 3`)
const LONG_FLAGS: &[&str] = &[
    "method", "file", "size", "folder", "merged", "config", "verbose", "format", "help", "version",
];

#[derive(Parser, Debug)]
#[command(
    name = "fchunk",
    version,
    about = "Split a file into fixed-size chunks, or merge chunks back",
    after_help = "Logs are appended to: ~/.local/share/filechunk/logs/filechunk.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Operation to run (cut, merge)
    #[arg(short, long, default_value = "cut")]
    pub method: Method,

    /// File to split
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Chunk size in MB
    #[arg(short, long)]
    pub size: Option<u64>,

    /// Directory of chunks to merge
    #[arg(short = 'd', long)]
    pub folder: Option<PathBuf>,

    /// Output path for the merged file
    #[arg(short = 'o', long)]
    pub merged: Option<PathBuf>,

    /// Report format (text, json)
    #[arg(long)]
    pub format: Option<OutputFormat>,
}

/// What the parsed arguments ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Split { source: PathBuf, size_mb: NonZeroU64 },
    Merge { folder: PathBuf, merged: PathBuf },
    /// Required arguments are missing; print usage and do nothing
    Usage,
}

impl Cli {
    /// True when usage is certain without looking at config
    ///
    /// An absent `--size` may still be filled from config, so only an empty
    /// path or an explicit zero size count here.
    pub fn missing_required(&self) -> bool {
        match self.method {
            Method::Cut => non_empty(self.file.as_ref()).is_none() || self.size == Some(0),
            Method::Merge => non_empty(self.folder.as_ref()).is_none() || non_empty(self.merged.as_ref()).is_none(),
        }
    }

    /// Resolve the operation, falling back to config for the chunk size
    pub fn request(&self, config: &Config) -> Request {
        match self.method {
            Method::Cut => {
                let source = non_empty(self.file.as_ref());
                let size = self.size.unwrap_or(config.split.default_size_mb);
                match (source, NonZeroU64::new(size)) {
                    (Some(source), Some(size_mb)) => Request::Split { source, size_mb },
                    _ => Request::Usage,
                }
            }
            Method::Merge => match (non_empty(self.folder.as_ref()), non_empty(self.merged.as_ref())) {
                (Some(folder), Some(merged)) => Request::Merge { folder, merged },
                _ => Request::Usage,
            },
        }
    }
}

fn non_empty(path: Option<&PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty()).cloned()
}

/// Rewrite `-name` and `-name=value` to `--name` for known long flags
///
/// Arguments after a bare `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|s| {
            let rest = s.strip_prefix('-')?;
            if rest.starts_with('-') {
                return None;
            }
            let name = rest.split('=').next().unwrap_or(rest);
            LONG_FLAGS.contains(&name).then(|| OsString::from(format!("-{}", s)))
        });
        out.push(rewritten.unwrap_or(arg));
    }

    out
}

/// Operation selected with `--method`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Cut,
    Merge,
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cut" | "split" => Ok(Self::Cut),
            "merge" => Ok(Self::Merge),
            _ => Err(format!("Unknown method: {}. Use: cut or merge", s)),
        }
    }
}

/// Output format for split and merge reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}
