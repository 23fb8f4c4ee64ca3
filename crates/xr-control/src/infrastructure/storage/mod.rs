//! Storage infrastructure: files owned by this process.
//!
//! - **`atomic`** – scratch-file + rename writes, so a concurrent reader
//!   never observes a half-written file at the canonical path.
//! - **`paths`** – where the channels and the settings file live.
//! - **`config_file`** – [`config_file::ConfigStore`], the persisted driver
//!   config.
//! - **`settings`** – [`settings::SettingsStore`], this tool's own
//!   preferences.

use std::path::PathBuf;

use thiserror::Error;

pub mod atomic;
pub mod config_file;
pub mod paths;
pub mod settings;

/// Error type for file persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set.
    #[error("could not determine the config home directory")]
    NoConfigHome,

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scratch file could not be renamed over the target.
    #[error("failed to replace {path} atomically: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings TOML could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
