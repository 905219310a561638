//! PhotoSelect File System Layer
//!
//! Provides:
//! - Image file enumeration for a single folder
//! - No-clobber copy and recycle-bin delete

mod browser;
mod file_operations;

pub use browser::{enumerate_images, is_image_path, FileList, ImageFile, IMAGE_EXTENSIONS};
pub use file_operations::{DefaultFileOperations, FileOpError, FileOperations};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
