//! User interaction the command layer needs from the front end

use std::path::PathBuf;

/// Blocking dialogs provided by the UI.
///
/// Every call returns before the command continues.
pub trait Dialogs {
    /// Ask for a directory; None if the user cancelled
    fn pick_folder(&self, title: &str) -> Option<PathBuf>;

    /// Yes/no question
    fn confirm(&self, title: &str, message: &str) -> bool;

    fn show_message(&self, title: &str, message: &str);

    fn show_error(&self, title: &str, message: &str);
}
