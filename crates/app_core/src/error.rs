//! Application error types

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("Folder unavailable: {}: {reason}", path.display())]
    DirectoryUnavailable { path: PathBuf, reason: String },

    #[error("Image decode error: {}: {reason}", path.display())]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("Copy failed: {}: {reason}", path.display())]
    CopyFailure { path: PathBuf, reason: String },

    #[error("Delete failed: {}: {reason}", path.display())]
    DeleteFailure { path: PathBuf, reason: String },

    #[error("Images are still loading")]
    LoadInProgress,

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Fatal Errors =====
    #[error("Image loader error: {0}")]
    Loader(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Loader(_) | AppError::Config(_))
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::DirectoryUnavailable { path, .. } => {
                format!("Cannot open folder: {}", path.display())
            }
            AppError::DecodeFailure { path, reason } => {
                format!("Cannot load image {}: {}", display_name(path), reason)
            }
            AppError::CopyFailure { path, reason } => {
                format!("Cannot copy {}: {}", display_name(path), reason)
            }
            AppError::DeleteFailure { path, reason } => {
                format!("Cannot delete {}: {}", display_name(path), reason)
            }
            AppError::LoadInProgress => "Please wait until loading finishes.".to_string(),
            _ => self.to_string(),
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
