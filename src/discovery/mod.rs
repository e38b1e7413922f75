//! File discovery under a run directory.
//!
//! Discovery happens in two steps:
//!
//! 1. [`collect_files`] walks the run directory once and returns every file,
//!    skipping directories whose path (relative to the root) contains one of
//!    the ignore substrings (scratch, in-flight transactions, split output, logs).
//! 2. [`filter_files`] selects from that list with a [`FileMatcher`], usually
//!    a regular expression rendered from a [`patterns::PatternSet`]. This step
//!    does no I/O.

use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::parsing::ParseError;

pub mod patterns;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Run directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<DiscoveryError> for ParseError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::Io(e) => ParseError::Io(e),
            DiscoveryError::RootNotFound(_) => {
                ParseError::Io(io::Error::new(io::ErrorKind::NotFound, err.to_string()))
            }
        }
    }
}

/// Decides whether a discovered path is selected
pub trait FileMatcher {
    fn matches(&self, path: &Path) -> bool;
}

/// Regular expressions search anywhere in the full path
impl FileMatcher for Regex {
    fn matches(&self, path: &Path) -> bool {
        self.is_match(&path.to_string_lossy())
    }
}

/// Adapter for arbitrary predicates
pub struct FnMatcher<F>(pub F);

impl<F> FileMatcher for FnMatcher<F>
where
    F: Fn(&Path) -> bool,
{
    fn matches(&self, path: &Path) -> bool {
        (self.0)(path)
    }
}

/// Recursively list the files under `root`, in file-name order.
///
/// Directories whose path relative to `root` contains any of `ignore` are
/// pruned with everything below them. Entries that cannot be read are
/// skipped with a warning.
///
/// # Errors
///
/// Returns `DiscoveryError::RootNotFound` if `root` does not exist, or
/// `DiscoveryError::Io` if the working directory is needed to make a
/// relative root absolute and cannot be read.
pub fn collect_files(root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::RootNotFound(root.to_path_buf()));
    }
    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(&root, entry, ignore));

    for entry in walker {
        match entry {
            Ok(entry) if !entry.file_type().is_dir() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => warn!(root = %root.display(), error = %err, "skipping unreadable entry"),
        }
    }

    Ok(files)
}

fn is_ignored(root: &Path, entry: &DirEntry, ignore: &[String]) -> bool {
    if !entry.file_type().is_dir() || ignore.is_empty() {
        return false;
    }
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    let relative = relative.to_string_lossy();
    ignore.iter().any(|pattern| relative.contains(pattern.as_str()))
}

/// Paths from `files` accepted by `matcher`, in their original order
#[must_use]
pub fn filter_files(files: &[PathBuf], matcher: &impl FileMatcher) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| matcher.matches(path))
        .cloned()
        .collect()
}
