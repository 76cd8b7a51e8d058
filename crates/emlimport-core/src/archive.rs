//! Moving imported files out of the way.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Directory that successfully imported files are moved into.
///
/// The directory is created with its parents on first use. Files keep
/// their base name; if that name is taken, a numeric suffix is added
/// (`msg.eml`, `msg-1.eml`, `msg-2.eml`, ...). Nothing is overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    /// Creates an archive rooted at `dir`. Nothing is touched yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the archive directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Moves `path` into the archive and returns its new location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be created or the file
    /// cannot be moved. The source file is left in place on failure.
    pub async fn archive(&self, path: &Path) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io(&self.dir, e))?;

        let name = path.file_name().ok_or_else(|| {
            Error::io(
                path,
                io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;
        let destination = self.free_destination(Path::new(name)).await?;

        move_file(path, &destination).await?;
        debug!(from = %path.display(), to = %destination.display(), "archived");
        Ok(destination)
    }

    /// Finds the first name under the archive directory that is not taken.
    async fn free_destination(&self, name: &Path) -> Result<PathBuf> {
        let candidate = self.dir.join(name);
        if !exists(&candidate).await? {
            return Ok(candidate);
        }

        let stem = name.file_stem().unwrap_or(name.as_os_str()).to_string_lossy();
        let extension = name.extension().map(|ext| ext.to_string_lossy());

        let mut n: u32 = 1;
        loop {
            let file_name = match &extension {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            let candidate = self.dir.join(file_name);
            if !exists(&candidate).await? {
                return Ok(candidate);
            }
            n = n.checked_add(1).ok_or_else(|| {
                Error::io(
                    &self.dir,
                    io::Error::new(ErrorKind::AlreadyExists, "no free archive name"),
                )
            })?;
        }
    }
}

async fn exists(path: &Path) -> Result<bool> {
    fs::try_exists(path).await.map_err(|e| Error::io(path, e))
}

/// Renames `from` to `to`, copying across filesystems when needed.
async fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "rename crosses devices, copying");
            copy_then_remove(from, to).await
        }
        Err(e) => Err(Error::io(from, e)),
    }
}

/// Copies `from` to `to`, then removes `from`.
async fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    let outcome = match fs::copy(from, to).await {
        Ok(_) => fs::remove_file(from).await,
        Err(e) => Err(e),
    };
    settle(from, to, outcome).await
}

/// Turns the outcome of a copy into the move's result.
///
/// On failure `to` is discarded, whether it is a partial copy or a
/// duplicate of a source that could not be removed.
async fn settle(from: &Path, to: &Path, outcome: io::Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(e) => {
            discard(to).await;
            Err(Error::io(from, e))
        }
    }
}

/// Removes `path` if it exists. Returns false, after logging, if it stays.
async fn discard(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot remove leftover copy");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_creates_directory_and_moves() {
        let tmp = TempDir::new().unwrap();
        let source = write(tmp.path(), "a.eml", "hello").await;
        let archive = Archive::new(tmp.path().join("done/nested"));

        let destination = archive.archive(&source).await.unwrap();

        assert_eq!(destination, tmp.path().join("done/nested/a.eml"));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_existing_directory_is_fine() {
        let tmp = TempDir::new().unwrap();
        let archive = Archive::new(tmp.path().join("imported"));
        fs::create_dir(archive.dir()).await.unwrap();
        let source = write(tmp.path(), "a.eml", "x").await;

        assert!(archive.archive(&source).await.is_ok());
    }

    #[tokio::test]
    async fn test_name_collision_gets_suffix() {
        let tmp = TempDir::new().unwrap();
        let archive = Archive::new(tmp.path().join("imported"));
        fs::create_dir(archive.dir()).await.unwrap();
        write(archive.dir(), "a.eml", "old").await;
        write(archive.dir(), "a-1.eml", "older").await;
        let source = write(tmp.path(), "a.eml", "new").await;

        let destination = archive.archive(&source).await.unwrap();

        assert_eq!(destination, archive.dir().join("a-2.eml"));
        assert_eq!(
            fs::read_to_string(archive.dir().join("a.eml")).await.unwrap(),
            "old"
        );
        assert_eq!(fs::read_to_string(&destination).await.unwrap(), "new");
    }

    #[tokio::test]
    async fn test_collision_without_extension() {
        let tmp = TempDir::new().unwrap();
        let archive = Archive::new(tmp.path().join("imported"));
        fs::create_dir(archive.dir()).await.unwrap();
        write(archive.dir(), "message", "old").await;
        let source = write(tmp.path(), "message", "new").await;

        let destination = archive.archive(&source).await.unwrap();

        assert_eq!(destination, archive.dir().join("message-1"));
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let archive = Archive::new(tmp.path().join("imported"));
        let missing = tmp.path().join("missing.eml");

        let err = archive.archive(&missing).await.unwrap_err();

        assert!(matches!(err, Error::Io { path, .. } if path == missing));
    }

    #[tokio::test]
    async fn test_directory_blocked_by_file() {
        let tmp = TempDir::new().unwrap();
        let blocker = write(tmp.path(), "imported", "not a dir").await;
        let source = write(tmp.path(), "a.eml", "x").await;

        let err = Archive::new(&blocker).archive(&source).await.unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_copy_then_remove_moves_file() {
        let tmp = TempDir::new().unwrap();
        let source = write(tmp.path(), "a.eml", "hello").await;
        let destination = tmp.path().join("b.eml");

        copy_then_remove(&source, &destination).await.unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_failed_copy_removes_partial_destination() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("missing.eml");
        let partial = write(tmp.path(), "a.eml", "trunc").await;

        let err = copy_then_remove(&source, &partial).await.unwrap_err();

        assert!(matches!(err, Error::Io { path, .. } if path == source));
        assert!(!partial.exists());
    }

    #[tokio::test]
    async fn test_unremovable_source_removes_copy() {
        let tmp = TempDir::new().unwrap();
        let source = write(tmp.path(), "a.eml", "hello").await;
        let copy = write(tmp.path(), "b.eml", "hello").await;
        let failure = io::Error::new(ErrorKind::PermissionDenied, "read-only");

        let err = settle(&source, &copy, Err(failure)).await.unwrap_err();

        assert!(matches!(err, Error::Io { path, .. } if path == source));
        assert!(source.exists());
        assert!(!copy.exists());
    }

    #[tokio::test]
    async fn test_failed_cleanup_keeps_original_error() {
        let tmp = TempDir::new().unwrap();
        let source = write(tmp.path(), "a.eml", "hello").await;
        let stuck = tmp.path().join("stuck");
        fs::create_dir(&stuck).await.unwrap();
        let failure = io::Error::new(ErrorKind::StorageFull, "disk full");

        let err = settle(&source, &stuck, Err(failure)).await.unwrap_err();

        match err {
            Error::Io { path, source: e } => {
                assert_eq!(path, source);
                assert_eq!(e.kind(), ErrorKind::StorageFull);
            }
            other => panic!("expected Io, got {other:?}"),
        }
        assert!(stuck.is_dir());
    }

    #[tokio::test]
    async fn test_discard() {
        let tmp = TempDir::new().unwrap();
        let file = write(tmp.path(), "a.eml", "x").await;
        let dir = tmp.path().join("dir");
        fs::create_dir(&dir).await.unwrap();

        assert!(discard(&file).await);
        assert!(!file.exists());
        assert!(discard(&tmp.path().join("never.eml")).await);
        assert!(!discard(&dir).await);
    }
}
