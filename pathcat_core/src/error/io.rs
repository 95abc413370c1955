//! Filesystem error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O error raised when the crawl root cannot be used
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// Root directory does not exist
    RootNotFound,
    /// Root exists but is not a directory
    NotADirectory,
    /// Permission denied on the root
    PermissionDenied,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create a root not found error
    pub fn root_not_found(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::RootNotFound,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create an error for a root that is a plain file
    pub fn not_a_directory(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::NotADirectory,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: &Path, source: std::io::Error) -> Self {
        Self {
            kind: IoErrorKind::PermissionDenied,
            path: Some(path.to_path_buf()),
            source: Some(source),
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::RootNotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            source: Some(source),
        }
    }

    /// Attach the offending path
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    match (&error.kind, &error.path) {
        (IoErrorKind::RootNotFound, Some(path)) => {
            format!("Root directory not found: {}", path.display())
        }
        (IoErrorKind::RootNotFound, None) => "Root directory not found".to_string(),
        (IoErrorKind::NotADirectory, Some(path)) => {
            format!("Root is not a directory: {}", path.display())
        }
        (IoErrorKind::NotADirectory, None) => "Root is not a directory".to_string(),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("Permission denied for root: {}", path.display())
        }
        (IoErrorKind::PermissionDenied, None) => "Permission denied".to_string(),
        (IoErrorKind::Other, _) => match (&error.source, &error.path) {
            (Some(source), Some(path)) => format!("I/O error on {}: {source}", path.display()),
            (Some(source), None) => format!("I/O error: {source}"),
            (None, _) => "I/O error".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_root_not_found_error() {
        let path = Path::new("/archive/cmip6");
        let error = IoError::root_not_found(path);

        assert_eq!(error.kind, IoErrorKind::RootNotFound);
        assert_eq!(error.path, Some(path.to_path_buf()));
        assert!(error.source.is_none());
        assert!(error.to_string().contains("Root directory not found"));
        assert!(error.to_string().contains("/archive/cmip6"));
    }

    #[test]
    fn test_permission_denied_error() {
        let path = Path::new("/root/archive");
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Access denied");
        let error = IoError::permission_denied(path, io_error);

        assert_eq!(error.kind, IoErrorKind::PermissionDenied);
        assert!(error.source.is_some());
        assert!(error.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_other_error_with_path() {
        let error = IoError::from_std(io::Error::other("disk on fire"))
            .with_path(Path::new("/archive"));

        assert_eq!(error.kind, IoErrorKind::Other);
        assert!(error.to_string().contains("/archive"));
        assert!(error.to_string().contains("disk on fire"));
    }
}
