//! This tool's own preferences, persisted as TOML.
//!
//! ```toml
//! dont_show_again = ["sbs_intro", "calibration_tips"]
//! installed_from_plugin_version = "0.1.0"
//! ```
//!
//! [`SettingsStore`] is loaded once at startup and flushed after every
//! mutation.  The settings file is separate from the driver config: the
//! driver never reads it.
//!
//! # Serde default values
//!
//! Every field has `#[serde(default)]`, so a file written by an older
//! version (or an empty file) still loads.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::atomic;
use super::StorageError;

/// Persisted preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Keys of UI hints the user dismissed, in the order they were dismissed.
    #[serde(default)]
    pub dont_show_again: Vec<String>,
    /// Plugin version that last installed the driver successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_from_plugin_version: Option<String>,
}

/// Owns the settings file and its in-memory copy.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Loads the settings file, returning defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] for file-system errors other than "not
    /// found", and [`StorageError::Parse`] if the TOML is malformed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let settings = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no settings at {}, using defaults", path.display());
                Settings::default()
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(Self { path, settings })
    }

    /// Like [`SettingsStore::load`], but a broken file is logged and replaced
    /// by defaults on the next flush.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(path.clone()) {
            Ok(store) => store,
            Err(e) => {
                warn!("ignoring unreadable settings: {e}");
                Self {
                    path,
                    settings: Settings::default(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Writes the in-memory settings to disk.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialize`] or an I/O error from the atomic
    /// write.
    pub fn flush(&self) -> Result<(), StorageError> {
        let content = toml::to_string_pretty(&self.settings)?;
        atomic::write_atomic(&self.path, &content, None).map_err(|e| {
            error!("failed to save settings to {}: {e}", self.path.display());
            e
        })
    }

    /// Applies `change` and flushes.  On a failed flush the in-memory copy is
    /// rolled back so memory and disk stay in step.
    fn update(&mut self, change: impl FnOnce(&mut Settings)) -> Result<(), StorageError> {
        let previous = self.settings.clone();
        change(&mut self.settings);
        if self.settings == previous {
            return Ok(());
        }
        if let Err(e) = self.flush() {
            self.settings = previous;
            return Err(e);
        }
        Ok(())
    }

    // ── Don't-show-again hints ────────────────────────────────────────────

    pub fn dont_show_again_keys(&self) -> &[String] {
        &self.settings.dont_show_again
    }

    /// Appends `key` unless it is already present.
    ///
    /// # Errors
    ///
    /// Propagates the flush failure.
    pub fn add_dont_show_again(&mut self, key: &str) -> Result<(), StorageError> {
        self.update(|s| {
            if !s.dont_show_again.iter().any(|k| k == key) {
                s.dont_show_again.push(key.to_string());
            }
        })
    }

    /// Clears every dismissed hint.
    ///
    /// # Errors
    ///
    /// Propagates the flush failure.
    pub fn reset_dont_show_again(&mut self) -> Result<(), StorageError> {
        self.update(|s| s.dont_show_again.clear())
    }

    // ── Installation record ───────────────────────────────────────────────

    pub fn installed_from_plugin_version(&self) -> Option<&str> {
        self.settings.installed_from_plugin_version.as_deref()
    }

    /// Records the version that installed the driver.
    ///
    /// # Errors
    ///
    /// Propagates the flush failure.
    pub fn record_installed_version(&mut self, version: &str) -> Result<(), StorageError> {
        self.update(|s| s.installed_from_plugin_version = Some(version.to_string()))?;
        info!("recorded driver installed from plugin version {version}");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("xr_settings_test_{}", Uuid::new_v4()));
        let path = dir.join("settings.toml");
        (dir, path)
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let (_dir, path) = temp_path();
        let store = SettingsStore::load(&path).expect("missing file is not an error");
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn test_add_dont_show_again_is_idempotent_and_persisted() {
        // Arrange
        let (dir, path) = temp_path();
        let mut store = SettingsStore::load(&path).unwrap();

        // Act
        store.add_dont_show_again("sbs_intro").unwrap();
        store.add_dont_show_again("calibration_tips").unwrap();
        store.add_dont_show_again("sbs_intro").unwrap();

        // Assert
        let reloaded = SettingsStore::load(&path).unwrap();
        assert_eq!(
            reloaded.dont_show_again_keys(),
            ["sbs_intro".to_string(), "calibration_tips".to_string()]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reset_dont_show_again_clears_list() {
        let (dir, path) = temp_path();
        let mut store = SettingsStore::load(&path).unwrap();
        store.add_dont_show_again("sbs_intro").unwrap();

        store.reset_dont_show_again().unwrap();

        assert!(SettingsStore::load(&path).unwrap().dont_show_again_keys().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_record_installed_version_round_trips() {
        let (dir, path) = temp_path();
        let mut store = SettingsStore::load(&path).unwrap();

        store.record_installed_version("1.2.3").unwrap();

        let reloaded = SettingsStore::load(&path).unwrap();
        assert_eq!(reloaded.installed_from_plugin_version(), Some("1.2.3"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_older_file_missing_fields_uses_defaults() {
        let (dir, path) = temp_path();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "dont_show_again = [\"a\"]\n").unwrap();

        let store = SettingsStore::load(&path).unwrap();

        assert_eq!(store.dont_show_again_keys(), ["a".to_string()]);
        assert_eq!(store.installed_from_plugin_version(), None);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_malformed_toml_is_parse_error_and_load_or_default_recovers() {
        let (dir, path) = temp_path();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "dont_show_again = [unterminated").unwrap();

        assert!(matches!(SettingsStore::load(&path), Err(StorageError::Parse(_))));
        assert_eq!(SettingsStore::load_or_default(&path).settings(), &Settings::default());

        std::fs::remove_dir_all(&dir).ok();
    }
}
