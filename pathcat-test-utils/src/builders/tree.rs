//! Temporary directory trees

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Builder for a temporary directory tree
///
/// Paths are `/`-separated and relative to the tree root. Parent directories
/// are created as needed.
#[derive(Debug, Default)]
pub struct TestTreeBuilder {
    files: Vec<(String, Vec<u8>)>,
    dirs: Vec<String>,
    symlinks: Vec<(String, String)>,
}

impl TestTreeBuilder {
    /// Create a new, empty tree builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty file
    pub fn file(self, path: &str) -> Self {
        self.file_with_content(path, b"")
    }

    /// Add several empty files
    pub fn files<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        for path in paths {
            self = self.file(path);
        }
        self
    }

    /// Add a file with content
    pub fn file_with_content(mut self, path: &str, content: &[u8]) -> Self {
        self.files.push((path.to_string(), content.to_vec()));
        self
    }

    /// Add an empty directory
    pub fn dir(mut self, path: &str) -> Self {
        self.dirs.push(path.to_string());
        self
    }

    /// Add a symbolic link at `link` pointing to `target`, both tree-relative
    pub fn symlink(mut self, link: &str, target: &str) -> Self {
        self.symlinks.push((link.to_string(), target.to_string()));
        self
    }

    /// Create the tree on disk
    pub fn build(self) -> io::Result<TestTree> {
        let dir = TempDir::new()?;
        let root = dir.path();

        for path in &self.dirs {
            fs::create_dir_all(root.join(path))?;
        }
        for (path, content) in &self.files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(full, content)?;
        }
        for (link, target) in &self.symlinks {
            let full = root.join(link);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            make_symlink(&root.join(target), &full)?;
        }

        Ok(TestTree { dir })
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// A directory tree removed when dropped
#[derive(Debug)]
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Tree root as a `/`-terminated string, for absolute templates
    pub fn root_prefix(&self) -> String {
        let mut root = self.dir.path().to_string_lossy().replace('\\', "/");
        if !root.ends_with('/') {
            root.push('/');
        }
        root
    }

    /// Every regular file in the tree, relative and sorted
    pub fn relative_files(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(self.dir.path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(self.dir.path())
                    .ok()
                    .map(|relative| relative.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_nested_files() {
        let tree = TestTreeBuilder::new()
            .files(["A/2020/data_01.csv", "B/notes.txt"])
            .dir("empty")
            .build()
            .unwrap();

        assert_eq!(
            tree.relative_files(),
            vec!["A/2020/data_01.csv", "B/notes.txt"]
        );
        assert!(tree.join("empty").is_dir());
    }

    #[test]
    fn test_root_prefix_ends_with_separator() {
        let tree = TestTreeBuilder::new().build().unwrap();
        assert!(tree.root_prefix().ends_with('/'));
    }
}
