//! The persisted driver config.
//!
//! [`ConfigStore`] owns the `key=value` config file the driver reads at
//! startup.  Reads never fail: a missing or unreadable file degrades to the
//! schema defaults.  Writes go through [`atomic::write_atomic`] and their
//! failures are propagated so the UI can surface them.
//!
//! # Write sequence
//!
//! ```text
//! submission ──▶ read previous file ──▶ keep its unmanaged external modes
//!            ──▶ apply ui_view (mapping wins on output_mode / disabled /
//!                external_mode) ──▶ render ──▶ scratch + rename ──▶ chmod 666
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use xr_core::{apply_view, Config, ConfigSubmission, ConfigWithView};

use super::atomic::{self, SHARED_FILE_MODE};
use super::StorageError;

/// Reads and writes the driver config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config and derives its view.
    pub fn read(&self) -> ConfigWithView {
        ConfigWithView::new(self.read_config())
    }

    /// Reads the config without the view.
    ///
    /// Starts from the schema defaults; a missing file leaves them as they
    /// are.  Any other I/O error is logged and also yields the defaults.
    pub fn read_config(&self) -> Config {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Config::from_text(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", self.path.display());
                Config::default()
            }
            Err(e) => {
                warn!("could not read config at {}: {e}; using defaults", self.path.display());
                Config::default()
            }
        }
    }

    /// Persists a submission and returns the stored config with a fresh view.
    ///
    /// When the submission carries a `ui_view`, the headset mode is mapped
    /// onto the config first, preserving the external modes this system does
    /// not manage from the file currently on disk.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the file cannot be replaced.  The file
    /// on disk is unchanged in that case.
    pub fn write(&self, submission: ConfigSubmission) -> Result<ConfigWithView, StorageError> {
        let ConfigSubmission { mut config, ui_view } = submission;

        if let Some(view) = ui_view {
            let previous = self.read_config();
            apply_view(&mut config, &view, previous.external_modes());
        }

        if let Err(e) = atomic::write_atomic(&self.path, &config.to_text(), Some(SHARED_FILE_MODE)) {
            error!("failed to write config to {}: {e}", self.path.display());
            return Err(e);
        }

        let stored = ConfigWithView::new(config);
        info!(
            "config written to {} (headset mode {})",
            self.path.display(),
            stored.ui_view.headset_mode
        );
        Ok(stored)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
