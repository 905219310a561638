//! Browse session: the current view, its images and bookmarks
//!
//! All state is mutated on the caller's thread. The only background work is
//! the [`LoadTask`] that decodes a new view; its results are applied when the
//! UI calls [`BrowseSession::poll_load`] or [`BrowseSession::wait_for_load`].

use crate::bookmarks::{carry_over, resolve_on_load, BookmarkSet, PendingFiles};
use crate::config::AppConfig;
use crate::image_cache::{DecodedImage, ImageCache};
use crate::image_loader::{LoadEvent, LoadOptions, LoadTask};
use crate::AppError;
use app_fs::{enumerate_images, DefaultFileOperations, FileList, FileOpError, FileOperations, ImageFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No view
    Idle,
    /// A view was chosen and its images are being decoded
    Loading,
    /// The view is complete and accepts selection and edits
    Ready,
}

/// What the current file list shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    Folder(PathBuf),
    Bookmarks,
}

/// Decode progress of the current view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

/// Things the UI should react to after polling a load
#[derive(Debug)]
pub enum SessionEvent {
    Progress(LoadProgress),
    DecodeSkipped { path: PathBuf, error: AppError },
    Ready { files: usize, bookmarked: usize, skipped: usize },
    LoadFailed(AppError),
    LoadCancelled,
}

/// Result of a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub destination: PathBuf,
    /// Paths of the new copies
    pub copied: Vec<PathBuf>,
    /// Files left queued because the destination already had that name
    pub conflicts: Vec<ImageFile>,
}

/// Session options taken from [`AppConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub load: LoadOptions,
    pub use_recycle_bin: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            use_recycle_bin: true,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            load: LoadOptions {
                max_size: config.browse.max_decode_size,
                policy: config.browse.decode_failure,
            },
            use_recycle_bin: config.files.use_recycle_bin,
        }
    }
}

pub struct BrowseSession {
    options: SessionOptions,
    file_ops: Arc<dyn FileOperations>,

    files: FileList,
    cache: ImageCache,
    bookmarks: BookmarkSet,
    pending: PendingFiles,
    selected: Option<usize>,

    state: SessionState,
    view: Option<ViewKind>,
    load: Option<LoadTask>,
    progress: LoadProgress,
    skipped: usize,
}

impl BrowseSession {
    pub fn new(options: SessionOptions, file_ops: Arc<dyn FileOperations>) -> Self {
        Self {
            options,
            file_ops,
            files: FileList::new(),
            cache: ImageCache::new(),
            bookmarks: BookmarkSet::new(),
            pending: PendingFiles::new(),
            selected: None,
            state: SessionState::Idle,
            view: None,
            load: None,
            progress: LoadProgress::default(),
            skipped: 0,
        }
    }

    /// Session backed by the real file system
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            SessionOptions::from_config(config),
            Arc::new(DefaultFileOperations::new()),
        )
    }

    // ===== Browse operations =====

    /// Replace the view with the images of `dir`.
    ///
    /// If the folder cannot be listed nothing changes. Current bookmarks are
    /// kept as pending files and come back if they appear in the new view.
    pub fn browse_folder(&mut self, dir: &Path) -> Result<(), AppError> {
        self.ensure_not_loading()?;

        let files = enumerate_images(dir).map_err(|e| AppError::DirectoryUnavailable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::info!("Browsing {} ({} images)", dir.display(), files.len());

        carry_over(&mut self.pending, &self.files, &self.bookmarks);
        self.bookmarks.clear();
        self.start_load(files, ViewKind::Folder(dir.to_path_buf()))
    }

    /// Replace the view with every bookmarked and pending file, all bookmarked
    pub fn browse_bookmarks(&mut self) -> Result<(), AppError> {
        self.ensure_not_loading()?;

        carry_over(&mut self.pending, &self.files, &self.bookmarks);
        let files = FileList::from_files(self.pending.take());

        tracing::info!("Browsing {} bookmarked images", files.len());

        self.bookmarks.mark_all(files.len());
        self.start_load(files, ViewKind::Bookmarks)
    }

    fn start_load(&mut self, files: FileList, view: ViewKind) -> Result<(), AppError> {
        let released = self.cache.clear();
        if released > 0 {
            tracing::debug!("Released {} cached images", released);
        }

        let task = match LoadTask::spawn(files.as_slice().to_vec(), self.options.load) {
            Ok(task) => task,
            Err(e) => {
                // Keep the new list's bookmarks for a later attempt
                carry_over(&mut self.pending, &files, &self.bookmarks);
                self.reset_view();
                return Err(e);
            }
        };

        self.progress = LoadProgress {
            loaded: 0,
            total: files.len(),
        };
        self.files = files;
        self.selected = None;
        self.skipped = 0;
        self.view = Some(view);
        self.state = SessionState::Loading;
        self.load = Some(task);
        Ok(())
    }

    /// Apply whatever the loader has produced so far without blocking
    pub fn poll_load(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();

        while let Some(task) = &self.load {
            let next = task.try_next();
            match next {
                Ok(Some(event)) => self.apply_load_event(event, &mut out),
                Ok(None) => break,
                Err(e) => self.fail_load(e, &mut out),
            }
        }

        out
    }

    /// Block until the current load ends, applying every event
    pub fn wait_for_load(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();

        while let Some(task) = &self.load {
            let next = task.next_blocking();
            match next {
                Ok(event) => self.apply_load_event(event, &mut out),
                Err(e) => self.fail_load(e, &mut out),
            }
        }

        out
    }

    /// Stop the running load; the view is dropped and bookmarks go back to pending
    pub fn cancel_load(&mut self) -> bool {
        let Some(task) = self.load.take() else {
            return false;
        };
        drop(task);

        tracing::info!("Load cancelled by request");
        self.abandon_view();
        true
    }

    fn apply_load_event(&mut self, event: LoadEvent, out: &mut Vec<SessionEvent>) {
        match event {
            LoadEvent::Decoded { path, image, loaded, total } => {
                self.cache.insert(path, image);
                self.progress = LoadProgress { loaded, total };
                out.push(SessionEvent::Progress(self.progress));
            }
            LoadEvent::Skipped { path, error, loaded, total } => {
                self.skipped += 1;
                self.progress = LoadProgress { loaded, total };
                out.push(SessionEvent::DecodeSkipped { path, error });
                out.push(SessionEvent::Progress(self.progress));
            }
            LoadEvent::Finished { .. } => {
                self.load = None;
                let resolved = resolve_on_load(&self.files, &mut self.pending);
                self.bookmarks.extend(resolved);
                self.state = SessionState::Ready;

                tracing::info!(
                    "View ready: {} images, {} bookmarked, {} skipped",
                    self.files.len(),
                    self.bookmarks.len(),
                    self.skipped
                );
                out.push(SessionEvent::Ready {
                    files: self.files.len(),
                    bookmarked: self.bookmarks.len(),
                    skipped: self.skipped,
                });
            }
            LoadEvent::Aborted { error, .. } => self.fail_load(error, out),
            LoadEvent::Cancelled { .. } => {
                self.load = None;
                self.abandon_view();
                out.push(SessionEvent::LoadCancelled);
            }
        }
    }

    fn fail_load(&mut self, error: AppError, out: &mut Vec<SessionEvent>) {
        self.load = None;
        tracing::error!("Load failed: {}", error);
        self.abandon_view();
        out.push(SessionEvent::LoadFailed(error));
    }

    /// Drop a half-loaded view, keeping its bookmarks pending
    fn abandon_view(&mut self) {
        carry_over(&mut self.pending, &self.files, &self.bookmarks);
        self.reset_view();
    }

    fn reset_view(&mut self) {
        self.files = FileList::new();
        self.bookmarks.clear();
        self.cache.clear();
        self.selected = None;
        self.view = None;
        self.progress = LoadProgress::default();
        self.state = SessionState::Idle;
    }

    fn ensure_not_loading(&self) -> Result<(), AppError> {
        if self.state == SessionState::Loading {
            return Err(AppError::LoadInProgress);
        }
        Ok(())
    }

    // ===== Selection =====

    /// Select the item at `index`; false if there is no such item or the view is not ready
    pub fn select(&mut self, index: usize) -> bool {
        if self.state != SessionState::Ready || index >= self.files.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    /// Move the selection by `delta` items.
    ///
    /// Returns false, leaving the selection alone, if nothing is selected or
    /// the target is outside the list.
    pub fn select_relative(&mut self, delta: isize) -> bool {
        let Some(current) = self.selected else {
            return false;
        };

        match current.checked_add_signed(delta) {
            Some(target) if target < self.files.len() => {
                self.selected = Some(target);
                true
            }
            _ => false,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_file(&self) -> Option<&ImageFile> {
        self.files.get(self.selected?)
    }

    /// Image to show in the preview pane
    pub fn preview(&self) -> Option<&DecodedImage> {
        self.cache.get(&self.selected_file()?.path)
    }

    /// Star state for the selected item
    pub fn is_selected_bookmarked(&self) -> bool {
        self.selected
            .map(|i| self.bookmarks.contains(i))
            .unwrap_or(false)
    }

    // ===== Bookmarks =====

    /// Flip the bookmark on the selected item; None if nothing is selected
    pub fn toggle_bookmark_on_selected(&mut self) -> Option<bool> {
        let index = self.selected?;
        let marked = self.bookmarks.toggle(index);
        tracing::debug!("Bookmark {} on item {}", if marked { "set" } else { "cleared" }, index);
        Some(marked)
    }

    /// Everything a save would copy: pending files, then bookmarked files of this view
    pub fn queued_for_save(&self) -> Vec<&ImageFile> {
        let mut queued: Vec<&ImageFile> = self.pending.iter().collect();
        for index in self.bookmarks.iter() {
            if let Some(file) = self.files.get(index) {
                if !self.pending.contains(&file.path) {
                    queued.push(file);
                }
            }
        }
        queued
    }

    // ===== File operations =====

    /// Copy every queued file into `destination` without overwriting.
    ///
    /// A name already taken in `destination` is reported as a conflict and
    /// the remaining files are still copied. Any other copy error stops the
    /// save and is returned. Files that were not copied stay queued; those in
    /// the current view show up bookmarked again.
    pub fn save(&mut self, destination: &Path) -> Result<SaveReport, AppError> {
        self.ensure_not_loading()?;

        if !destination.is_dir() {
            return Err(AppError::DirectoryUnavailable {
                path: destination.to_path_buf(),
                reason: "not a directory".into(),
            });
        }

        carry_over(&mut self.pending, &self.files, &self.bookmarks);
        self.bookmarks.clear();

        let queued = self.pending.take();
        tracing::info!("Saving {} images to {}", queued.len(), destination.display());

        let mut report = SaveReport {
            destination: destination.to_path_buf(),
            ..Default::default()
        };
        let mut failure = None;

        for file in queued {
            if failure.is_some() {
                self.pending.insert(file);
                continue;
            }

            match self.file_ops.copy_no_clobber(&file.path, destination) {
                Ok(target) => report.copied.push(target),
                Err(FileOpError::AlreadyExists(target)) => {
                    tracing::warn!("Not overwriting {}", target.display());
                    report.conflicts.push(file.clone());
                    self.pending.insert(file);
                }
                Err(e) => {
                    tracing::error!("Copy of {} failed: {}", file.path.display(), e);
                    failure = Some(AppError::CopyFailure {
                        path: file.path.clone(),
                        reason: e.to_string(),
                    });
                    self.pending.insert(file);
                }
            }
        }

        let resolved = resolve_on_load(&self.files, &mut self.pending);
        self.bookmarks.extend(resolved);

        match failure {
            Some(e) => Err(e),
            None => {
                tracing::info!(
                    "Saved {} images, {} conflicts",
                    report.copied.len(),
                    report.conflicts.len()
                );
                Ok(report)
            }
        }
    }

    /// Delete the selected file after `confirm` agrees.
    ///
    /// The item leaves the view before the file is deleted and stays gone even
    /// if the deletion fails. Returns the removed file, or None if nothing was
    /// selected or the user declined.
    pub fn delete_selected<F>(&mut self, confirm: F) -> Result<Option<ImageFile>, AppError>
    where
        F: FnOnce(&ImageFile) -> bool,
    {
        let Some(index) = self.selected else {
            return Ok(None);
        };
        let Some(file) = self.files.get(index) else {
            return Ok(None);
        };

        if !confirm(file) {
            return Ok(None);
        }

        let removed = self.files.remove(index);
        self.cache.evict(&removed.path);
        self.bookmarks.remove_and_shift(index);

        // The next item slides into the deleted slot
        self.selected = if self.files.is_empty() {
            None
        } else {
            Some(index.min(self.files.len() - 1))
        };

        match self.file_ops.delete(&removed.path, self.options.use_recycle_bin) {
            Ok(()) => {
                tracing::info!("Deleted {}", removed.path.display());
                Ok(Some(removed))
            }
            Err(e) => {
                tracing::error!("Delete of {} failed: {}", removed.path.display(), e);
                Err(AppError::DeleteFailure {
                    path: removed.path,
                    reason: e.to_string(),
                })
            }
        }
    }

    // ===== Accessors =====

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn view(&self) -> Option<&ViewKind> {
        self.view.as_ref()
    }

    pub fn files(&self) -> &FileList {
        &self.files
    }

    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    pub fn pending(&self) -> &PendingFiles {
        &self.pending
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}
