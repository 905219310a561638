//! Folder browser - lists the image files of one directory

use crate::{FsError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extensions accepted by [`enumerate_images`], lowercase
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tiff", "tif", "bmp", "ico", "emf", "cur", "wmf",
];

/// One image file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Absolute path, also the file's identity
    pub path: PathBuf,
    /// File name shown in the thumbnail list
    pub name: String,
    pub modified: SystemTime,
}

impl ImageFile {
    /// Create an image file entry by reading the file's metadata
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            modified: metadata.modified()?,
        })
    }
}

/// Ordered list of image files; the index is the file's position in the view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    files: Vec<ImageFile>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap files in the given order
    pub fn from_files(files: Vec<ImageFile>) -> Self {
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageFile> {
        self.files.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageFile> {
        self.files.iter()
    }

    pub fn as_slice(&self) -> &[ImageFile] {
        &self.files
    }

    /// Index of the file with this path
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.files.iter().position(|f| f.path == path)
    }

    /// Remove the file at `index`; every following index shifts down by one.
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> ImageFile {
        self.files.remove(index)
    }

    pub fn into_vec(self) -> Vec<ImageFile> {
        self.files
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a ImageFile;
    type IntoIter = std::slice::Iter<'a, ImageFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Check if a path has an accepted image extension (case-insensitive)
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// List the image files directly inside `dir`.
///
/// Subdirectories are not descended into. The result is sorted by
/// modification time, most recent first; files with the same timestamp are
/// ordered by path so repeated calls agree.
pub fn enumerate_images<P: AsRef<Path>>(dir: P) -> Result<FileList> {
    let dir = dir.as_ref();

    if !dir.exists() {
        return Err(FsError::NotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(FsError::InvalidPath(format!("Not a directory: {}", dir.display())));
    }

    let dir = fs::canonicalize(dir)?;
    let mut files = Vec::new();

    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();

        if !is_image_path(&path) {
            continue;
        }

        // Follows symlinks, so a link to an image counts as a file
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry {}: {}", path.display(), e);
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("Skipping entry without mtime {}: {}", path.display(), e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        files.push(ImageFile { path, name, modified });
    }

    sort_newest_first(&mut files);

    tracing::debug!("Found {} images in {}", files.len(), dir.display());
    Ok(FileList::from_files(files))
}

fn sort_newest_first(files: &mut [ImageFile]) {
    files.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.path.cmp(&b.path))
    });
}
