//! Application configuration

use crate::command::CommandId;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browse: BrowseConfig,
    pub files: FileConfig,
    pub keybindings: HashMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browse: BrowseConfig::default(),
            files: FileConfig::default(),
            keybindings: default_keybindings(),
        }
    }
}

/// Thumbnail loading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    /// Longest edge of a decoded image; `None` keeps the original size
    pub max_decode_size: Option<u32>,
    /// What to do when one file in a folder cannot be decoded
    pub decode_failure: DecodePolicy,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            max_decode_size: None,
            decode_failure: DecodePolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub confirm_delete: bool,
    pub use_recycle_bin: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            confirm_delete: true,
            use_recycle_bin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodePolicy {
    /// Keep going; the file stays listed without a thumbnail
    #[serde(rename = "skip")]
    Skip,
    /// Stop the whole load at the first failure
    #[serde(rename = "abort")]
    Abort,
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults if it is absent
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "PhotoSelect", "PhotoSelect")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}

fn default_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    // Navigation
    kb.insert(CommandId::NAV_PREV_ITEM.into(), vec!["Left".into(), "Up".into()]);
    kb.insert(CommandId::NAV_NEXT_ITEM.into(), vec!["Right".into(), "Down".into()]);

    // Bookmarks
    kb.insert(CommandId::META_TOGGLE_BOOKMARK.into(), vec!["?".into()]);

    // Files
    kb.insert(CommandId::FILE_DELETE.into(), vec!["Delete".into()]);

    // App
    kb.insert(CommandId::APP_HELP.into(), vec!["F1".into()]);

    kb
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [browse]
            decode_failure = "abort"
            "#,
        )
        .unwrap();

        assert_eq!(config.browse.decode_failure, DecodePolicy::Abort);
        assert_eq!(config.browse.max_decode_size, None);
        assert!(config.files.confirm_delete);
        assert!(config.files.use_recycle_bin);
        assert_eq!(
            config.keybindings.get(CommandId::META_TOGGLE_BOOKMARK),
            Some(&vec!["?".to_string()])
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.browse.max_decode_size = Some(512);
        config.files.use_recycle_bin = false;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.browse.max_decode_size, Some(512));
        assert!(!loaded.files.use_recycle_bin);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.browse.decode_failure, DecodePolicy::Skip);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "browse = 3").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
