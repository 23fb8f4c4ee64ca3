//! Fire-and-forget command channel to the driver.
//!
//! Flags are validated against the known vocabulary; whatever survives is
//! written as `key=value` lines.  The driver consumes the file on its next
//! poll.  Nothing is read back.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use xr_core::domain::control::RejectedFlag;
use xr_core::{validate_flags, ControlFlags};

use crate::infrastructure::storage::atomic::{self, SHARED_FILE_MODE};
use crate::infrastructure::storage::StorageError;

/// What happened to a batch of flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControlFlagReport {
    /// Keys that were written.
    pub accepted: Vec<String>,
    /// Entries that were dropped, with the reason.
    pub rejected: Vec<RejectedFlag>,
}

/// Writes control flags to the driver's control file.
#[derive(Debug, Clone)]
pub struct ControlFlagChannel {
    path: PathBuf,
}

impl ControlFlagChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates `flags` and writes the accepted ones.
    ///
    /// Invalid entries are logged and reported, never raised.  When nothing
    /// is accepted the file is left alone, so a command the driver has not
    /// consumed yet is not clobbered by an empty write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] only when the file cannot be written.
    pub fn write(&self, flags: &Map<String, Value>) -> Result<ControlFlagReport, StorageError> {
        let validated = validate_flags(flags);
        for rejected in &validated.rejected {
            warn!(
                "dropping control flag {}={}: {}",
                rejected.key, rejected.value, rejected.reason
            );
        }

        let report = ControlFlagReport {
            accepted: validated.accepted.iter().map(|(key, _)| key.clone()).collect(),
            rejected: validated.rejected.clone(),
        };

        if report.accepted.is_empty() {
            debug!("no valid control flags to send");
            return Ok(report);
        }

        if let Err(e) = atomic::write_atomic(&self.path, &validated.to_text(), Some(SHARED_FILE_MODE)) {
            error!("failed to write control flags to {}: {e}", self.path.display());
            return Err(e);
        }

        info!("sent control flags: {}", report.accepted.join(", "));
        Ok(report)
    }

    /// Sends a typed command set.
    ///
    /// # Errors
    ///
    /// See [`ControlFlagChannel::write`].
    pub fn send(&self, flags: &ControlFlags) -> Result<ControlFlagReport, StorageError> {
        self.write(&flags.to_map())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
