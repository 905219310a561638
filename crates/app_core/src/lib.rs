//! PhotoSelect Core Domain Logic
//!
//! This crate contains:
//! - Browse session (current view, selection, load lifecycle)
//! - Bookmarks and the pending save queue
//! - Background image loading and the decoded image cache
//! - Command system and key map
//! - Configuration
//! - Error types

pub mod bookmarks;
pub mod command;
pub mod config;
pub mod dialogs;
pub mod error;
pub mod image_cache;
pub mod image_loader;
pub mod session;

pub use bookmarks::{carry_over, resolve_on_load, BookmarkSet, PendingFiles};
pub use command::{Command, CommandDispatcher, CommandId, CommandParams, KeyMap};
pub use config::{AppConfig, BrowseConfig, DecodePolicy, FileConfig};
pub use dialogs::Dialogs;
pub use error::AppError;
pub use image_cache::{CacheStats, DecodedImage, ImageCache};
pub use image_loader::{decode_image, LoadEvent, LoadOptions, LoadTask};
pub use session::{
    BrowseSession, LoadProgress, SaveReport, SessionEvent, SessionOptions, SessionState, ViewKind,
};
