//! Locations of the channels and the service's own files.
//!
//! The driver reads its config from the user's config home and exchanges
//! control flags and state through shared memory files:
//!
//! - config:        `$XDG_CONFIG_HOME/xr_driver/config.ini`
//!   (or `~/.config/xr_driver/config.ini`)
//! - control flags: `/dev/shm/xr_driver_control`
//! - driver state:  `/dev/shm/xr_driver_state`
//!
//! Everything here is a plain value handed to constructors; nothing reads
//! these paths from a global.

use std::path::PathBuf;
use std::time::Duration;

use xr_core::STALE_AFTER_SECS;

use super::StorageError;

pub const DRIVER_CONFIG_DIR: &str = "xr_driver";
pub const DRIVER_CONFIG_FILE: &str = "config.ini";
pub const CONTROL_FLAGS_PATH: &str = "/dev/shm/xr_driver_control";
pub const DRIVER_STATE_PATH: &str = "/dev/shm/xr_driver_state";
pub const SETTINGS_DIR: &str = "xr_control";
pub const SETTINGS_FILE: &str = "settings.toml";

/// Where the three driver channels live.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPaths {
    pub config_file: PathBuf,
    pub control_flags: PathBuf,
    pub driver_state: PathBuf,
}

impl ChannelPaths {
    /// Default locations derived from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoConfigHome`] when neither `XDG_CONFIG_HOME`
    /// nor `HOME` is set.
    pub fn from_env() -> Result<Self, StorageError> {
        Ok(Self {
            config_file: config_home()?.join(DRIVER_CONFIG_DIR).join(DRIVER_CONFIG_FILE),
            control_flags: PathBuf::from(CONTROL_FLAGS_PATH),
            driver_state: PathBuf::from(DRIVER_STATE_PATH),
        })
    }
}

/// Spacing and bound for the driver install retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub spacing: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            spacing: Duration::from_secs(1),
        }
    }
}

/// Everything the control-plane service needs to find its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub channels: ChannelPaths,
    /// This tool's own preferences file.
    pub settings_file: PathBuf,
    /// Directory holding the driver's user binaries (`xr_driver_cli`,
    /// `xr_driver_uninstall`).
    pub bin_dir: PathBuf,
    /// Installer script run by `driver install`.
    pub setup_script: PathBuf,
    /// Version recorded in settings after a successful install.
    pub plugin_version: String,
    pub stale_after_secs: u64,
    pub retry: RetryPolicy,
}

impl ServiceConfig {
    /// Defaults derived from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoConfigHome`] when the config home cannot be
    /// resolved.
    pub fn from_env() -> Result<Self, StorageError> {
        let home = home_dir().ok_or(StorageError::NoConfigHome)?;
        let bin_dir = home.join(".local").join("bin");
        Ok(Self {
            channels: ChannelPaths::from_env()?,
            settings_file: config_home()?.join(SETTINGS_DIR).join(SETTINGS_FILE),
            setup_script: bin_dir.join("xr_driver_setup"),
            bin_dir,
            plugin_version: env!("CARGO_PKG_VERSION").to_string(),
            stale_after_secs: STALE_AFTER_SECS,
            retry: RetryPolicy::default(),
        })
    }
}

/// Resolves `XDG_CONFIG_HOME`, falling back to `~/.config`.
///
/// # Errors
///
/// Returns [`StorageError::NoConfigHome`] when neither variable is set.
pub fn config_home() -> Result<PathBuf, StorageError> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".config")))
        .ok_or(StorageError::NoConfigHome)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").filter(|p| !p.is_empty()).map(PathBuf::from)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
