//! # xr-core
//!
//! Shared library for the XR driver control plane: the config schema, the
//! headset-mode translator, the control-flag vocabulary and the driver-state
//! model, plus the `key=value` text codec they all use.
//!
//! It has no file system, process or UI dependencies.
//!
//! # Architecture overview (for beginners)
//!
//! An XR headset driver runs as a separate process.  It talks to the rest of
//! the system only through three small text files:
//!
//! ```text
//!                      config file (read at driver startup)
//!   control plane  ───────────────────────────────────────▶  driver
//!                      control flags (polled by the driver)
//!                  ───────────────────────────────────────▶
//!                      driver state (refreshed with a heartbeat)
//!                  ◀───────────────────────────────────────
//! ```
//!
//! This crate defines what goes into those files:
//!
//! - **`protocol`** – the line format and its forgiving scalar parsers.
//! - **`domain`** – the typed config and its schema, the UI headset-mode view,
//!   control flags, driver state and the license record.

pub mod domain;
pub mod protocol;

pub use domain::config::{Config, ConfigError, ConfigValue, FieldDefault, FieldSpec, CONFIG_SCHEMA};
pub use domain::control::{validate_flags, ControlFlags, SbsModeControl, ValidatedFlags};
pub use domain::driver_state::{DriverState, DriverStateReport, STALE_AFTER_SECS};
pub use domain::license::License;
pub use domain::view::{
    apply_view, config_to_headset_mode, headset_mode_to_config, ConfigSubmission, ConfigWithView,
    HeadsetMode, ViewModel,
};
pub use protocol::codec::CodecError;
