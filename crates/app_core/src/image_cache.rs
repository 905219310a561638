//! In-memory store of decoded images for the current view
//!
//! Entries are keyed by full path. A bookmark-only view can hold files from
//! several folders, and two of them may share a file name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl DecodedImage {
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: usize,
}

/// Owner of every decoded image buffer
#[derive(Debug, Default)]
pub struct ImageCache {
    images: HashMap<PathBuf, DecodedImage>,
    bytes: usize,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an image, returning the one it replaced
    pub fn insert(&mut self, path: PathBuf, image: DecodedImage) -> Option<DecodedImage> {
        self.bytes += image.byte_len();
        let old = self.images.insert(path, image);
        if let Some(old) = &old {
            self.bytes -= old.byte_len();
        }
        old
    }

    pub fn get(&self, path: &Path) -> Option<&DecodedImage> {
        self.images.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.images.contains_key(path)
    }

    /// Remove one image and hand its buffer back to the caller
    pub fn evict(&mut self, path: &Path) -> Option<DecodedImage> {
        let image = self.images.remove(path)?;
        self.bytes -= image.byte_len();
        tracing::debug!("Evicted image: {}", path.display());
        Some(image)
    }

    /// Release every image; returns how many were released
    pub fn clear(&mut self) -> usize {
        let released = self.images.len();
        self.images.clear();
        self.bytes = 0;
        released
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.images.len(),
            bytes: self.bytes,
        }
    }
}
