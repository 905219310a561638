//! Command system for user actions

use crate::config::AppConfig;
use crate::dialogs::Dialogs;
use crate::session::BrowseSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Navigation commands
    pub const NAV_PREV_ITEM: &'static str = "nav.prev_item";
    pub const NAV_NEXT_ITEM: &'static str = "nav.next_item";

    // Metadata commands
    pub const META_TOGGLE_BOOKMARK: &'static str = "meta.toggle_bookmark";

    // File commands
    pub const FILE_BROWSE_FOLDER: &'static str = "file.browse_folder";
    pub const FILE_BROWSE_BOOKMARKS: &'static str = "file.browse_bookmarks";
    pub const FILE_SAVE: &'static str = "file.save";
    pub const FILE_DELETE: &'static str = "file.delete";

    // App commands
    pub const APP_HELP: &'static str = "app.help";

    /// Every command with its help description, in help order
    pub const ALL: &'static [(&'static str, &'static str)] = &[
        (Self::FILE_BROWSE_FOLDER, "Browse the images of a folder"),
        (Self::FILE_BROWSE_BOOKMARKS, "Browse every bookmarked image"),
        (Self::NAV_PREV_ITEM, "Select the previous image"),
        (Self::NAV_NEXT_ITEM, "Select the next image"),
        (Self::META_TOGGLE_BOOKMARK, "Bookmark or unbookmark the selected image"),
        (Self::FILE_SAVE, "Copy bookmarked images to a folder"),
        (Self::FILE_DELETE, "Delete the selected image"),
        (Self::APP_HELP, "Show this help"),
    ];
}

/// Command with optional parameters
#[derive(Debug, Clone)]
pub struct Command {
    pub id: CommandId,
    pub params: CommandParams,
}

/// Command parameters
#[derive(Debug, Clone, Default)]
pub struct CommandParams {
    /// Folder for browse and save; the user is asked when absent
    pub path_value: Option<PathBuf>,
}

impl Command {
    pub fn new(id: &str) -> Self {
        Self {
            id: CommandId::new(id),
            params: CommandParams::default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.params.path_value = Some(path.into());
        self
    }
}

/// Key name to command lookup, built from the `[keybindings]` table
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    keys: HashMap<String, String>,
    by_command: HashMap<String, Vec<String>>,
}

impl KeyMap {
    pub fn new(bindings: &HashMap<String, Vec<String>>) -> Self {
        let mut ids: Vec<&String> = bindings.keys().collect();
        ids.sort();

        let mut map = Self::default();
        for id in ids {
            for key in &bindings[id] {
                let normalized = key.to_lowercase();
                if let Some(existing) = map.keys.get(&normalized) {
                    tracing::warn!("Key {} is bound to both {} and {}; keeping {}", key, existing, id, existing);
                    continue;
                }
                map.keys.insert(normalized, id.clone());
                map.by_command.entry(id.clone()).or_default().push(key.clone());
            }
        }
        map
    }

    /// Command bound to `key`, ignoring case
    pub fn resolve(&self, key: &str) -> Option<Command> {
        self.keys.get(&key.to_lowercase()).map(|id| Command::new(id))
    }

    /// Keys bound to a command, as written in the configuration
    pub fn keys_for(&self, command_id: &str) -> &[String] {
        self.by_command
            .get(command_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Runs commands against a session, talking to the user through [`Dialogs`]
pub struct CommandDispatcher {
    keymap: KeyMap,
    confirm_delete: bool,
}

impl CommandDispatcher {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            keymap: KeyMap::new(&config.keybindings),
            confirm_delete: config.files.confirm_delete,
        }
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    /// Execute `cmd`; returns false if the command is unknown
    pub fn execute(&self, session: &mut BrowseSession, dialogs: &dyn Dialogs, cmd: &Command) -> bool {
        tracing::debug!("Executing command: {}", cmd.id.as_str());

        match cmd.id.as_str() {
            CommandId::NAV_PREV_ITEM => self.step(session, -1),
            CommandId::NAV_NEXT_ITEM => self.step(session, 1),
            CommandId::META_TOGGLE_BOOKMARK => {
                session.toggle_bookmark_on_selected();
            }
            CommandId::FILE_BROWSE_FOLDER => {
                let Some(dir) = self.folder(cmd, dialogs, "Select a folder to browse") else {
                    return true;
                };
                if let Err(e) = session.browse_folder(&dir) {
                    dialogs.show_error("Operation failed", &e.user_message());
                }
            }
            CommandId::FILE_BROWSE_BOOKMARKS => {
                if let Err(e) = session.browse_bookmarks() {
                    dialogs.show_error("Operation failed", &e.user_message());
                }
            }
            CommandId::FILE_SAVE => {
                let Some(dest) = self.folder(cmd, dialogs, "Select a folder to save to") else {
                    return true;
                };
                match session.save(&dest) {
                    Ok(report) => {
                        dialogs.show_message("Saved", &format!("Saved to {}", report.destination.display()));
                        if !report.conflicts.is_empty() {
                            let names: Vec<&str> = report.conflicts.iter().map(|f| f.name.as_str()).collect();
                            dialogs.show_message(
                                "Warning",
                                &format!("Not copied, name already taken: {}", names.join(", ")),
                            );
                        }
                    }
                    Err(e) => dialogs.show_error("Operation failed", &e.user_message()),
                }
            }
            CommandId::FILE_DELETE => {
                let confirm_delete = self.confirm_delete;
                let result = session.delete_selected(|file| {
                    !confirm_delete || dialogs.confirm("Delete", &format!("Delete {}?", file.name))
                });
                if let Err(e) = result {
                    dialogs.show_error("Operation failed", &e.user_message());
                }
            }
            CommandId::APP_HELP => dialogs.show_message("Help", &self.help_text()),
            other => {
                tracing::warn!("Unknown command: {}", other);
                return false;
            }
        }

        true
    }

    /// Move the selection, starting at the first image when nothing is selected
    fn step(&self, session: &mut BrowseSession, delta: isize) {
        if session.selected().is_none() {
            session.select(0);
        } else {
            session.select_relative(delta);
        }
    }

    fn folder(&self, cmd: &Command, dialogs: &dyn Dialogs, title: &str) -> Option<PathBuf> {
        cmd.params
            .path_value
            .clone()
            .or_else(|| dialogs.pick_folder(title))
    }

    /// One line per command with its keys
    pub fn help_text(&self) -> String {
        let mut text = String::new();
        for (id, description) in CommandId::ALL {
            let keys = self.keymap.keys_for(id);
            let keys = if keys.is_empty() {
                "-".to_string()
            } else {
                keys.join(", ")
            };
            text.push_str(&format!("{:<12} {:<24} {}\n", keys, id, description));
        }
        text
    }
}
