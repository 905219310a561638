//! Image decoding and the background loader for a browse operation

use crate::config::DecodePolicy;
use crate::image_cache::DecodedImage;
use crate::AppError;
use app_fs::ImageFile;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use image::{GenericImageView, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// How a load decodes its files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub max_size: Option<u32>,
    pub policy: DecodePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_size: None,
            policy: DecodePolicy::Skip,
        }
    }
}

/// Message from the loader thread, in file order.
///
/// `loaded` counts processed files and grows by one per event up to `total`.
#[derive(Debug)]
pub enum LoadEvent {
    Decoded {
        path: PathBuf,
        image: DecodedImage,
        loaded: usize,
        total: usize,
    },
    Skipped {
        path: PathBuf,
        error: AppError,
        loaded: usize,
        total: usize,
    },
    Aborted {
        path: PathBuf,
        error: AppError,
    },
    Cancelled {
        loaded: usize,
    },
    Finished {
        loaded: usize,
    },
}

impl LoadEvent {
    /// Is this the last event of the load?
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoadEvent::Aborted { .. } | LoadEvent::Cancelled { .. } | LoadEvent::Finished { .. }
        )
    }
}

/// A running load on its own thread.
///
/// Dropping the task cancels it and waits for the thread to exit.
pub struct LoadTask {
    events: Receiver<LoadEvent>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    total: usize,
}

impl LoadTask {
    /// Start decoding `files` in order
    pub fn spawn(files: Vec<ImageFile>, options: LoadOptions) -> Result<Self, AppError> {
        let (tx, rx) = unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let total = files.len();

        let worker = std::thread::Builder::new()
            .name("image-loader".into())
            .spawn(move || run_load(files, options, &flag, &tx))?;

        tracing::debug!("Image loader started for {} files", total);

        Ok(Self {
            events: rx,
            cancel,
            worker: Some(worker),
            total,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Next event if one is ready
    pub fn try_next(&self) -> Result<Option<LoadEvent>, AppError> {
        match self.events.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(worker_gone()),
        }
    }

    /// Wait for the next event
    pub fn next_blocking(&self) -> Result<LoadEvent, AppError> {
        self.events.recv().map_err(|_| worker_gone())
    }

    /// Ask the loader to stop before its next file
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

impl Drop for LoadTask {
    fn drop(&mut self) {
        self.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Image loader thread panicked");
            }
        }
    }
}

fn worker_gone() -> AppError {
    AppError::Loader("loader thread exited without finishing".into())
}

fn run_load(files: Vec<ImageFile>, options: LoadOptions, cancel: &AtomicBool, events: &Sender<LoadEvent>) {
    let total = files.len();
    let mut loaded = 0;

    for file in files {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!("Image load cancelled after {}/{} files", loaded, total);
            let _ = events.send(LoadEvent::Cancelled { loaded });
            return;
        }

        let event = match decode_image(&file.path, options.max_size) {
            Ok(image) => {
                loaded += 1;
                LoadEvent::Decoded { path: file.path, image, loaded, total }
            }
            Err(error) => match options.policy {
                DecodePolicy::Skip => {
                    loaded += 1;
                    tracing::warn!("Skipping {}: {}", file.path.display(), error);
                    LoadEvent::Skipped { path: file.path, error, loaded, total }
                }
                DecodePolicy::Abort => {
                    tracing::error!("Image load aborted at {}: {}", file.path.display(), error);
                    let _ = events.send(LoadEvent::Aborted { path: file.path, error });
                    return;
                }
            },
        };

        if events.send(event).is_err() {
            // Receiver dropped together with its session
            return;
        }
    }

    tracing::debug!("Image load finished: {} files", loaded);
    let _ = events.send(LoadEvent::Finished { loaded });
}

/// Read and decode one image file into RGBA8.
///
/// The format is detected from the file content. With `max_size`, larger
/// images are scaled down to fit a `max_size` square.
pub fn decode_image(path: &Path, max_size: Option<u32>) -> Result<DecodedImage, AppError> {
    tracing::debug!("Decoding image: {}", path.display());

    let failure = |reason: String| AppError::DecodeFailure {
        path: path.to_path_buf(),
        reason,
    };

    let data = std::fs::read(path).map_err(|e| failure(e.to_string()))?;

    let reader = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| failure(e.to_string()))?;

    let img = reader.decode().map_err(|e| failure(e.to_string()))?;

    let img = match max_size {
        Some(max) => {
            let (w, h) = img.dimensions();
            if w > max || h > max {
                img.thumbnail(max, max)
            } else {
                img
            }
        }
        None => img,
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        data: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> ImageFile {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        ImageFile::from_path(&path).unwrap()
    }

    fn write_garbage(dir: &Path, name: &str) -> ImageFile {
        let path = dir.join(name);
        std::fs::write(&path, b"definitely not pixels").unwrap();
        ImageFile {
            path,
            name: name.to_string(),
            modified: SystemTime::now(),
        }
    }

    fn drain(task: &LoadTask) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        loop {
            let event = task.next_blocking().unwrap();
            let done = event.is_terminal();
            events.push(event);
            if done {
                return events;
            }
        }
    }

    #[test]
    fn test_decode_image() {
        let dir = TempDir::new().unwrap();
        let file = write_png(dir.path(), "a.png", 4, 2);

        let image = decode_image(&file.path, None).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.data.len(), 4 * 2 * 4);
        assert_eq!(&image.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_downscales() {
        let dir = TempDir::new().unwrap();
        let file = write_png(dir.path(), "big.png", 40, 20);

        let image = decode_image(&file.path, Some(10)).unwrap();
        assert_eq!((image.width, image.height), (10, 5));
    }

    #[test]
    fn test_decode_detects_format_from_content() {
        let dir = TempDir::new().unwrap();
        let file = write_png(dir.path(), "real.png", 3, 3);
        let renamed = dir.path().join("actually_png.bmp");
        std::fs::rename(&file.path, &renamed).unwrap();

        assert!(decode_image(&renamed, None).is_ok());
    }

    #[test]
    fn test_decode_failure() {
        let dir = TempDir::new().unwrap();
        let file = write_garbage(dir.path(), "bad.png");

        let err = decode_image(&file.path, None).unwrap_err();
        assert!(matches!(err, AppError::DecodeFailure { path, .. } if path == file.path));
    }

    #[test]
    fn test_load_reports_progress_in_order() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write_png(dir.path(), "a.png", 1, 1),
            write_png(dir.path(), "b.png", 2, 2),
            write_png(dir.path(), "c.png", 3, 3),
        ];
        let expected: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();

        let task = LoadTask::spawn(files, LoadOptions::default()).unwrap();
        assert_eq!(task.total(), 3);
        let events = drain(&task);

        let mut seen = Vec::new();
        for (i, event) in events[..3].iter().enumerate() {
            match event {
                LoadEvent::Decoded { path, loaded, total, .. } => {
                    assert_eq!(*loaded, i + 1);
                    assert_eq!(*total, 3);
                    seen.push(path.clone());
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(seen, expected);
        assert!(matches!(events[3], LoadEvent::Finished { loaded: 3 }));
    }

    #[test]
    fn test_skip_policy_continues() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write_png(dir.path(), "a.png", 1, 1),
            write_garbage(dir.path(), "bad.gif"),
            write_png(dir.path(), "c.png", 1, 1),
        ];

        let task = LoadTask::spawn(files, LoadOptions::default()).unwrap();
        let events = drain(&task);

        assert_eq!(events.len(), 4);
        assert!(matches!(events[1], LoadEvent::Skipped { loaded: 2, .. }));
        assert!(matches!(events[2], LoadEvent::Decoded { loaded: 3, .. }));
        assert!(matches!(events[3], LoadEvent::Finished { loaded: 3 }));
    }

    #[test]
    fn test_abort_policy_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let bad = write_garbage(dir.path(), "bad.gif");
        let files = vec![
            write_png(dir.path(), "a.png", 1, 1),
            bad.clone(),
            write_png(dir.path(), "c.png", 1, 1),
        ];
        let options = LoadOptions {
            policy: DecodePolicy::Abort,
            ..Default::default()
        };

        let task = LoadTask::spawn(files, options).unwrap();
        let events = drain(&task);

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], LoadEvent::Aborted { path, .. } if *path == bad.path));
    }

    #[test]
    fn test_cancel_before_start() {
        let dir = TempDir::new().unwrap();
        let files: Vec<_> = (0..20)
            .map(|i| write_png(dir.path(), &format!("{}.png", i), 8, 8))
            .collect();

        let task = LoadTask::spawn(files, LoadOptions::default()).unwrap();
        task.cancel();
        assert!(task.is_cancelled());

        let events = drain(&task);
        match events.last().unwrap() {
            LoadEvent::Cancelled { loaded } => assert!(*loaded < 20),
            LoadEvent::Finished { loaded } => assert_eq!(*loaded, 20),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_empty_load_finishes() {
        let task = LoadTask::spawn(Vec::new(), LoadOptions::default()).unwrap();
        assert!(matches!(task.next_blocking().unwrap(), LoadEvent::Finished { loaded: 0 }));
    }
}
