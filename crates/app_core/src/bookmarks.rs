//! Bookmarks on the current view and the pending set carried across views
//!
//! A bookmark is an index into the current [`FileList`]. When the view is
//! replaced, bookmarked files move into [`PendingFiles`] by path, and are
//! turned back into indices once they show up in a new view.

use app_fs::{FileList, ImageFile};
use std::path::Path;

/// Bookmarked indices, in the order they were marked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
    indices: Vec<usize>,
}

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the bookmark on `index`; returns whether it is now bookmarked
    pub fn toggle(&mut self, index: usize) -> bool {
        if let Some(pos) = self.indices.iter().position(|&i| i == index) {
            self.indices.remove(pos);
            false
        } else {
            self.indices.push(index);
            true
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Bookmark `index` if it is not already
    pub fn insert(&mut self, index: usize) {
        if !self.contains(index) {
            self.indices.push(index);
        }
    }

    /// Bookmark every index in `0..len`, replacing the current set
    pub fn mark_all(&mut self, len: usize) {
        self.indices = (0..len).collect();
    }

    /// Forget `index` and shift the marks of every later item down by one,
    /// matching a removal from the file list
    pub fn remove_and_shift(&mut self, index: usize) {
        self.indices.retain(|&i| i != index);
        for i in &mut self.indices {
            if *i > index {
                *i -= 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl Extend<usize> for BookmarkSet {
    fn extend<T: IntoIterator<Item = usize>>(&mut self, iter: T) {
        for index in iter {
            self.insert(index);
        }
    }
}

/// Files waiting to be saved that are not bookmarked in the current view.
///
/// Keeps insertion order and holds each path at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingFiles {
    files: Vec<ImageFile>,
}

impl PendingFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file unless one with the same path is already pending
    pub fn insert(&mut self, file: ImageFile) -> bool {
        if self.contains(&file.path) {
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    /// Drain every pending file, in order
    pub fn take(&mut self) -> Vec<ImageFile> {
        std::mem::take(&mut self.files)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageFile> {
        self.files.iter()
    }
}

impl Extend<ImageFile> for PendingFiles {
    fn extend<T: IntoIterator<Item = ImageFile>>(&mut self, iter: T) {
        for file in iter {
            self.insert(file);
        }
    }
}

/// Move the files behind `bookmarks` into `pending` before `files` is replaced.
///
/// Already pending files stay; the result is the union.
pub fn carry_over(pending: &mut PendingFiles, files: &FileList, bookmarks: &BookmarkSet) {
    for index in bookmarks.iter() {
        match files.get(index) {
            Some(file) => {
                pending.insert(file.clone());
            }
            None => tracing::warn!("Bookmark {} is outside a list of {}", index, files.len()),
        }
    }
}

/// Find pending files that are part of `files`.
///
/// Those files leave `pending` and their indices in `files` are returned, in
/// pending order.
pub fn resolve_on_load(files: &FileList, pending: &mut PendingFiles) -> Vec<usize> {
    let mut resolved = Vec::new();
    let mut still_pending = Vec::new();

    for file in pending.take() {
        match files.position(&file.path) {
            Some(index) => resolved.push(index),
            None => still_pending.push(file),
        }
    }

    pending.files = still_pending;
    resolved
}
