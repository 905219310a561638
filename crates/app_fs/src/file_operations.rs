//! File operations module
//! Provides the copy and delete operations behind save and delete

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File operation errors
#[derive(Debug, Error)]
pub enum FileOpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trash error: {0}")]
    #[cfg(feature = "trash-support")]
    Trash(#[from] trash::Error),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, FileOpError>;

/// File operations trait
pub trait FileOperations: Send + Sync {
    /// Copy `source` into `target_dir` under the same file name.
    /// Never overwrites an existing file; returns the new path.
    fn copy_no_clobber(&self, source: &Path, target_dir: &Path) -> Result<PathBuf>;

    /// Delete a file (move to trash or permanent delete)
    fn delete(&self, path: &Path, use_trash: bool) -> Result<()>;
}

/// Default implementation of file operations
#[derive(Debug, Default)]
pub struct DefaultFileOperations;

impl DefaultFileOperations {
    pub fn new() -> Self {
        Self
    }
}

impl FileOperations for DefaultFileOperations {
    fn copy_no_clobber(&self, source: &Path, target_dir: &Path) -> Result<PathBuf> {
        if !target_dir.exists() {
            return Err(FileOpError::NotFound(target_dir.to_path_buf()));
        }

        if !target_dir.is_dir() {
            return Err(FileOpError::InvalidOperation(
                "Target must be a directory".to_string(),
            ));
        }

        if !source.is_file() {
            return Err(FileOpError::NotFound(source.to_path_buf()));
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| FileOpError::InvalidOperation("Invalid file name".to_string()))?;
        let target = target_dir.join(file_name);

        // create_new fails atomically if the name is taken
        let mut output = match File::options().write(true).create_new(true).open(&target) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(FileOpError::AlreadyExists(target));
            }
            Err(e) => return Err(e.into()),
        };

        let copied = File::open(source).and_then(|mut input| io::copy(&mut input, &mut output));
        if let Err(e) = copied {
            drop(output);
            // Remove the partial copy
            let _ = fs::remove_file(&target);
            return Err(e.into());
        }

        tracing::info!("Copied: {} -> {}", source.display(), target.display());
        Ok(target)
    }

    #[cfg(feature = "trash-support")]
    fn delete(&self, path: &Path, use_trash: bool) -> Result<()> {
        if !path.exists() {
            return Err(FileOpError::NotFound(path.to_path_buf()));
        }

        if use_trash {
            trash::delete(path)?;
            tracing::info!("Moved to trash: {}", path.display());
        } else {
            fs::remove_file(path)?;
            tracing::warn!("Permanently deleted: {}", path.display());
        }

        Ok(())
    }

    #[cfg(not(feature = "trash-support"))]
    fn delete(&self, path: &Path, _use_trash: bool) -> Result<()> {
        // Fallback: always permanent delete
        if !path.exists() {
            return Err(FileOpError::NotFound(path.to_path_buf()));
        }

        fs::remove_file(path)?;
        tracing::warn!("Permanently deleted: {}", path.display());

        Ok(())
    }
}
