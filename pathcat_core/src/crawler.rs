//! Filesystem crawler
//!
//! Walks a root directory with walkdir, pruning every directory the traversal
//! pattern rules out, and yields the entries matching the full pattern.
//! Unreadable entries, broken links and symlink loops become
//! [`TraversalWarning`]s instead of errors.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

use crate::error::{IoError, Result};
use crate::template::TraversalPattern;

/// Options for a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Follow symbolic links (loops are detected and skipped)
    pub follow_links: bool,
    /// Maximum depth below the root (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            follow_links: true,
            max_depth: None,
        }
    }
}

impl CrawlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Set maximum depth below the root
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Entry admitted by the traversal pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path on disk
    pub path: PathBuf,
    /// Path relative to the crawl root, `/`-separated; directories end in `/`
    pub relative: String,
    /// Text the pattern was matched against: `relative`, or the absolute path
    /// for absolute patterns
    pub key: String,
}

/// Kind of traversal warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    SymlinkLoop,
    PermissionDenied,
    NotFound,
    Other,
}

/// Problem with a single entry, skipped during the crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalWarning {
    pub kind: WarningKind,
    pub path: Option<PathBuf>,
    pub message: String,
}

impl TraversalWarning {
    fn from_walk_error(error: &walkdir::Error) -> Self {
        let kind = if error.loop_ancestor().is_some() {
            WarningKind::SymlinkLoop
        } else {
            match error.io_error().map(std::io::Error::kind) {
                Some(std::io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
                Some(std::io::ErrorKind::NotFound) => WarningKind::NotFound,
                _ => WarningKind::Other,
            }
        };

        Self {
            kind,
            path: error.path().map(Path::to_path_buf),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for TraversalWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Lazy, single-use crawl of one root
///
/// Create a new crawler to traverse again.
pub struct Crawler {
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
    root: PathBuf,
    pattern: Arc<TraversalPattern>,
    warnings: Vec<TraversalWarning>,
    done: bool,
}

impl Crawler {
    /// Start a crawl of `root`
    ///
    /// Fails only when the root itself cannot be listed.
    pub fn new(
        root: &Path,
        pattern: impl Into<Arc<TraversalPattern>>,
        options: &CrawlOptions,
    ) -> Result<Self> {
        let pattern = pattern.into();
        check_root(root)?;

        let root = if pattern.is_absolute() {
            std::path::absolute(root).map_err(|e| IoError::from_std(e).with_path(root))?
        } else {
            root.to_path_buf()
        };

        let mut walker = WalkDir::new(&root)
            .follow_links(options.follow_links)
            .sort_by_file_name();
        if let Some(depth) = options.max_depth {
            walker = walker.max_depth(depth);
        }

        let filter_root = root.clone();
        let filter_pattern = Arc::clone(&pattern);
        let walker = walker.into_iter().filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let Some((_, key)) = entry_keys(&filter_root, entry, filter_pattern.is_absolute())
            else {
                return true;
            };

            let keep = filter_pattern.could_contain(&key)
                || (filter_pattern.is_directory() && filter_pattern.matches(&key));
            if !keep {
                log::debug!("Pruning {}", entry.path().display());
            }
            keep
        });

        Ok(Self {
            walker: Box::new(walker),
            root,
            pattern,
            warnings: Vec::new(),
            done: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pattern(&self) -> &TraversalPattern {
        &self.pattern
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[TraversalWarning] {
        &self.warnings
    }

    /// Take the warnings collected so far
    pub fn take_warnings(&mut self) -> Vec<TraversalWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn candidate(&self, entry: &DirEntry) -> Option<Candidate> {
        let (relative, key) = entry_keys(&self.root, entry, self.pattern.is_absolute())?;
        Some(Candidate {
            path: entry.path().to_path_buf(),
            relative,
            key,
        })
    }
}

impl Iterator for Crawler {
    type Item = Candidate;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.walker.next() {
                None => self.done = true,
                Some(Ok(entry)) => {
                    if entry.depth() == 0
                        || entry.file_type().is_dir() != self.pattern.is_directory()
                    {
                        continue;
                    }
                    if let Some(candidate) = self.candidate(&entry)
                        && self.pattern.matches(&candidate.key)
                    {
                        return Some(candidate);
                    }
                }
                Some(Err(e)) => {
                    let warning = TraversalWarning::from_walk_error(&e);
                    log::warn!("Skipping entry during crawl: {warning}");
                    self.warnings.push(warning);
                }
            }
        }
        None
    }
}

impl FusedIterator for Crawler {}

impl fmt::Debug for Crawler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("root", &self.root)
            .field("pattern", &self.pattern.as_str())
            .field("warnings", &self.warnings.len())
            .field("done", &self.done)
            .finish()
    }
}

fn check_root(root: &Path) -> Result<()> {
    let classify = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => IoError::root_not_found(root),
        std::io::ErrorKind::PermissionDenied => IoError::permission_denied(root, e),
        _ => IoError::from_std(e).with_path(root),
    };

    let metadata = fs::metadata(root).map_err(classify)?;
    if !metadata.is_dir() {
        return Err(IoError::not_a_directory(root).into());
    }
    fs::read_dir(root).map_err(classify)?;
    Ok(())
}

/// Relative path and pattern key of an entry
fn entry_keys(root: &Path, entry: &DirEntry, absolute: bool) -> Option<(String, String)> {
    let mut relative = slash_path(entry.path().strip_prefix(root).ok()?);
    let mut key = if absolute {
        slash_path(entry.path())
    } else {
        relative.clone()
    };

    if entry.file_type().is_dir() {
        relative.push('/');
        key.push('/');
    }
    Some((relative, key))
}

/// Path text with `/` separators
pub(crate) fn slash_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text.into_owned()
    }
}
