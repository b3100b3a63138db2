//! Application settings persistence
//!
//! Handles saving and loading user preferences.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::library::SortOrder;
use super::sleep_timer::{SleepTimerConfig, SleepTimerPreferences};

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Volume level (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Sleep timer configuration and any in-flight timer
    #[serde(default)]
    pub sleep_timer: SleepTimerPreferences,
    /// Sleep timer tick and fade timing
    #[serde(default)]
    pub sleep_timer_tuning: SleepTimerConfig,
    /// Library browsing settings
    #[serde(default)]
    pub library: LibrarySettings,
}

fn default_volume() -> f32 {
    1.0
}

/// Library-related settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LibrarySettings {
    /// Order songs are listed in
    #[serde(default)]
    pub song_sort: SortOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            sleep_timer: SleepTimerPreferences::default(),
            sleep_timer_tuning: SleepTimerConfig::default(),
            library: LibrarySettings::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ember", "Ember")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            tracing::warn!("Could not determine config directory, using default settings");
            return Self::default();
        };
        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Failed to load settings from {:?}: {}", path, e);
                }
                Self::default()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(path) = Self::file_path() {
            self.save_to_file(&path)
        } else {
            Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            ))
        }
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SettingsError::Io(e.to_string()))?;
        tracing::debug!("Settings saved to {:?}", path);
        Ok(())
    }
}

/// Errors that can occur with settings
#[derive(Debug, Clone)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}
