//! Local file access: the user-granted root directory and host capability.
//!
//! Rows reference files by bare name; every name resolves directly under the
//! root. The root is shared read-only between all row tasks and the uploader.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{DataError, DataErrorKind};

/// What the host can do with local files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// True if files can be opened and read directly.
    pub native_file_access: bool,
}

impl HostCapabilities {
    pub fn detect() -> Self {
        Self {
            native_file_access: cfg!(any(unix, windows)),
        }
    }
}

/// Why a referenced file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum FileRefError {
    #[error("invalid file name '{0}': expected a plain file name inside the root directory")]
    InvalidName(String),
    #[error("file '{0}' not found in the root directory")]
    NotFound(String),
    #[error("cannot access file '{name}': {reason}")]
    Access { name: String, reason: String },
}

impl FileRefError {
    pub fn kind(&self) -> DataErrorKind {
        match self {
            FileRefError::InvalidName(_) => DataErrorKind::InvalidFilenameFormat,
            FileRefError::NotFound(_) => DataErrorKind::FileNotFound,
            FileRefError::Access { .. } => DataErrorKind::FileAccessError,
        }
    }

    pub fn to_data_error(&self) -> DataError {
        DataError::new(self.kind(), self.to_string())
    }

    fn from_io(name: &str, e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            FileRefError::NotFound(name.to_string())
        } else {
            FileRefError::Access {
                name: name.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// A directory the user granted read access to.
#[derive(Debug, Clone)]
pub struct RootDir {
    path: PathBuf,
}

impl RootDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Map a bare file name to its path under the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, FileRefError> {
        let trimmed = name.trim();
        let bad = trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\'])
            || trimmed.chars().any(char::is_control);
        if bad {
            return Err(FileRefError::InvalidName(name.to_string()));
        }
        Ok(self.path.join(trimmed))
    }

    /// Size in bytes of a referenced file.
    pub async fn size_of(&self, name: &str) -> Result<u64, FileRefError> {
        let path = self.resolve(name)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FileRefError::from_io(name, e))?;
        if !meta.is_file() {
            return Err(FileRefError::Access {
                name: name.to_string(),
                reason: "not a regular file".to_string(),
            });
        }
        Ok(meta.len())
    }

    /// Open a referenced file for reading; returns the handle and its size.
    pub async fn open(&self, name: &str) -> Result<(tokio::fs::File, u64), FileRefError> {
        let size = self.size_of(name).await?;
        let path = self.resolve(name)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| FileRefError::from_io(name, e))?;
        Ok((file, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_paths() {
        let root = RootDir::new("/data");
        assert!(matches!(root.resolve("../etc/passwd"), Err(FileRefError::InvalidName(_))));
        assert!(matches!(root.resolve("a/b.txt"), Err(FileRefError::InvalidName(_))));
        assert!(matches!(root.resolve("  "), Err(FileRefError::InvalidName(_))));
        assert_eq!(root.resolve(" x.csv ").unwrap(), PathBuf::from("/data/x.csv"));
    }

    #[tokio::test]
    async fn size_of_reports_missing_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"abcd").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let root = RootDir::new(dir.path());

        assert_eq!(root.size_of("a.bin").await.unwrap(), 4);
        let missing = root.size_of("nope.bin").await.unwrap_err();
        assert_eq!(missing.kind(), DataErrorKind::FileNotFound);
        let sub = root.size_of("sub").await.unwrap_err();
        assert_eq!(sub.kind(), DataErrorKind::FileAccessError);
    }
}
