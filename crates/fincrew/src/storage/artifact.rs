//! Uploaded artifacts on disk and their guaranteed cleanup.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::StorageError;

/// Writes uploaded bytes to `<data_dir>/financial_document_<uuid>.pdf`.
///
/// The file is created with `create_new`, so an existing file is never
/// overwritten; each returned path belongs to exactly one upload.
pub fn write_upload(data_dir: &Path, content: &[u8]) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(data_dir).map_err(|e| StorageError::CreateDirectory {
        path: data_dir.to_path_buf(),
        source: e,
    })?;

    let path = data_dir.join(format!("financial_document_{}.pdf", Uuid::new_v4()));
    let write = |path: &Path| -> std::io::Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(content)?;
        file.sync_all()
    };

    if let Err(e) = write(&path) {
        // Don't leave a partial artifact behind.
        let _ = std::fs::remove_file(&path);
        return Err(StorageError::WriteFile { path, source: e });
    }

    Ok(path)
}

/// Owns an artifact path and deletes the file when dropped, including
/// during unwinding.
#[derive(Debug)]
pub struct ArtifactGuard {
    path: PathBuf,
    released: bool,
}

impl ArtifactGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the artifact now. Returns whether a file was actually removed;
    /// calling it again, or on a file that is already gone, is a no-op.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("Deleted artifact {}", self.path.display());
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                log::warn!("Failed to delete artifact {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        self.release();
    }
}
