//! Error taxonomy for the curation pipeline.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type CuratorResult<T> = Result<T, CuratorError>;

#[derive(Debug, Error)]
pub enum CuratorError {
    #[error("Note not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied reading {}", .0.display())]
    AccessDenied(PathBuf),

    #[error("Unsupported file extension for {} (expected one of: md, markdown, mdown, mkd)", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Backup file missing: {}", .0.display())]
    BackupMissing(PathBuf),

    #[error("Backup {} failed integrity check (expected {expected}, found {actual})", .path.display())]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Processing failed: {message}")]
    ProcessingFailed { message: String, log: Vec<String> },
}

impl CuratorError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        CuratorError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Map a read failure onto the validation variants where one applies.
    pub fn from_read(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => CuratorError::NotFound(path),
            io::ErrorKind::PermissionDenied => CuratorError::AccessDenied(path),
            _ => CuratorError::Io { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_read_maps_kinds() {
        let e = CuratorError::from_read("/x.md", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, CuratorError::NotFound(_)));
        let e = CuratorError::from_read("/x.md", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, CuratorError::AccessDenied(_)));
        let e = CuratorError::from_read("/x.md", io::Error::other("boom"));
        assert!(matches!(e, CuratorError::Io { .. }));
    }

    #[test]
    fn test_display_is_actionable() {
        let e = CuratorError::Integrity {
            path: PathBuf::from("/b/note.md.bak"),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(e.to_string().contains("integrity"));
        assert!(e.to_string().contains("/b/note.md.bak"));
    }
}
