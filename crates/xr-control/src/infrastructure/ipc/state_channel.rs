//! Reader for the driver's published state.
//!
//! The driver rewrites the state file in place.  A read may therefore catch
//! a half-written file; the line parser skips what it cannot use and the
//! heartbeat rule sorts out the rest.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};
use xr_core::{DriverState, DriverStateReport, STALE_AFTER_SECS};

/// Reads the driver state channel.
#[derive(Debug, Clone)]
pub struct DriverStateReader {
    path: PathBuf,
    stale_after_secs: u64,
}

impl DriverStateReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stale_after_secs: STALE_AFTER_SECS,
        }
    }

    /// Overrides the heartbeat threshold.
    pub fn with_stale_after(mut self, secs: u64) -> Self {
        self.stale_after_secs = secs;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state and applies the staleness rule against the wall clock.
    pub fn read(&self) -> DriverStateReport {
        self.read_at(unix_now())
    }

    /// Reads the state and applies the staleness rule against `now_secs`.
    pub fn read_at(&self, now_secs: u64) -> DriverStateReport {
        let state = self.read_snapshot();
        if state.is_stale_after(now_secs, self.stale_after_secs) {
            debug!("driver state is stale (heartbeat {})", state.heartbeat);
        }
        state.into_report_after(now_secs, self.stale_after_secs)
    }

    /// Parses the whole file without the staleness rule.
    ///
    /// A missing or unreadable file yields the all-defaults state.
    pub fn read_snapshot(&self) -> DriverState {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => DriverState::from_text(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no driver state at {}", self.path.display());
                DriverState::default()
            }
            Err(e) => {
                warn!("could not read driver state at {}: {e}", self.path.display());
                DriverState::default()
            }
        }
    }
}

/// Seconds since the Unix epoch.  A clock before the epoch reads as `0`.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
