//! Live driver status and the heartbeat staleness rule.
//!
//! The driver periodically rewrites its state channel, stamping a
//! `heartbeat` (seconds since the Unix epoch) each time.  A heartbeat of `0`,
//! or one more than [`STALE_AFTER_SECS`] old, means the driver has stopped
//! reporting: only the `device_license` survives in that case, because the
//! license is cached by the driver and stays meaningful without a live device.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::license::License;
use crate::protocol::codec;

/// Maximum heartbeat age, in seconds, for the state to count as live.
pub const STALE_AFTER_SECS: u64 = 5;

/// Error for one state-channel line that could not be applied.
#[derive(Debug, Error, PartialEq)]
pub enum DriverStateError {
    #[error("unknown calibration value for {key}: {value}")]
    UnknownCalibration { key: &'static str, value: String },

    #[error("device_license is not valid JSON: {0}")]
    InvalidLicense(String),

    #[error("unknown driver state key: {0}")]
    UnknownKey(String),
}

/// How the driver calibrates the headset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationSetup {
    #[default]
    Automatic,
    Interactive,
}

impl CalibrationSetup {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "AUTOMATIC" => Some(CalibrationSetup::Automatic),
            "INTERACTIVE" => Some(CalibrationSetup::Interactive),
            _ => None,
        }
    }
}

/// Where the driver is in its calibration cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationState {
    #[default]
    NotCalibrated,
    Calibrating,
    Calibrated,
    WaitingOnUser,
}

impl CalibrationState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "NOT_CALIBRATED" => Some(CalibrationState::NotCalibrated),
            "CALIBRATING" => Some(CalibrationState::Calibrating),
            "CALIBRATED" => Some(CalibrationState::Calibrated),
            "WAITING_ON_USER" => Some(CalibrationState::WaitingOnUser),
            _ => None,
        }
    }
}

impl fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CalibrationState::NotCalibrated => "NOT_CALIBRATED",
            CalibrationState::Calibrating => "CALIBRATING",
            CalibrationState::Calibrated => "CALIBRATED",
            CalibrationState::WaitingOnUser => "WAITING_ON_USER",
        };
        f.write_str(text)
    }
}

/// A full snapshot of the driver state channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    pub heartbeat: u64,
    pub connected_device_brand: Option<String>,
    pub connected_device_model: Option<String>,
    pub calibration_setup: CalibrationSetup,
    pub calibration_state: CalibrationState,
    pub sbs_mode_enabled: bool,
    pub sbs_mode_supported: bool,
    pub firmware_update_recommended: bool,
    /// Structured license record, kept verbatim.
    pub device_license: Value,
}

impl Default for DriverState {
    fn default() -> Self {
        Self {
            heartbeat: 0,
            connected_device_brand: None,
            connected_device_model: None,
            calibration_setup: CalibrationSetup::default(),
            calibration_state: CalibrationState::default(),
            sbs_mode_enabled: false,
            sbs_mode_supported: false,
            firmware_update_recommended: false,
            device_license: Value::Object(Map::new()),
        }
    }
}

impl DriverState {
    /// Parses the text of the state channel on top of the defaults.
    ///
    /// Bad lines are logged and skipped.
    pub fn from_text(text: &str) -> Self {
        let mut state = DriverState::default();
        for entry in codec::entries(text) {
            match entry {
                Ok((key, raw)) => match state.apply_line(key, raw) {
                    Ok(()) => {}
                    Err(DriverStateError::UnknownKey(key)) => {
                        debug!("ignoring unknown driver state key {key}")
                    }
                    Err(e) => warn!("skipping driver state line {key}: {e}"),
                },
                Err(e) => warn!("skipping malformed driver state line: {e}"),
            }
        }
        state
    }

    /// Applies one `key=value` entry.
    ///
    /// # Errors
    ///
    /// Returns [`DriverStateError`] for unknown keys, unknown calibration
    /// values and license payloads that are not JSON.  The state is left
    /// unchanged in that case.
    pub fn apply_line(&mut self, key: &str, raw: &str) -> Result<(), DriverStateError> {
        match key {
            "heartbeat" => {
                self.heartbeat = u64::try_from(codec::parse_int(raw, self.heartbeat as i64))
                    .unwrap_or(self.heartbeat)
            }
            "connected_device_brand" => self.connected_device_brand = non_empty(raw),
            "connected_device_model" => self.connected_device_model = non_empty(raw),
            "calibration_setup" => {
                self.calibration_setup = CalibrationSetup::parse(raw).ok_or_else(|| {
                    DriverStateError::UnknownCalibration {
                        key: "calibration_setup",
                        value: raw.to_string(),
                    }
                })?
            }
            "calibration_state" => {
                self.calibration_state = CalibrationState::parse(raw).ok_or_else(|| {
                    DriverStateError::UnknownCalibration {
                        key: "calibration_state",
                        value: raw.to_string(),
                    }
                })?
            }
            "sbs_mode_enabled" => {
                self.sbs_mode_enabled = codec::parse_boolean(raw, self.sbs_mode_enabled)
            }
            "sbs_mode_supported" => {
                self.sbs_mode_supported = codec::parse_boolean(raw, self.sbs_mode_supported)
            }
            "firmware_update_recommended" => {
                self.firmware_update_recommended =
                    codec::parse_boolean(raw, self.firmware_update_recommended)
            }
            "device_license" => {
                if !raw.is_empty() {
                    self.device_license = serde_json::from_str(raw)
                        .map_err(|e| DriverStateError::InvalidLicense(e.to_string()))?;
                }
            }
            other => return Err(DriverStateError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Returns `true` when the heartbeat is missing or older than
    /// [`STALE_AFTER_SECS`] relative to `now_secs`.
    ///
    /// A heartbeat in the future (clock skew) counts as fresh.
    pub fn is_stale(&self, now_secs: u64) -> bool {
        self.is_stale_after(now_secs, STALE_AFTER_SECS)
    }

    /// Like [`DriverState::is_stale`] with an explicit threshold.
    pub fn is_stale_after(&self, now_secs: u64, stale_after_secs: u64) -> bool {
        self.heartbeat == 0 || now_secs.saturating_sub(self.heartbeat) > stale_after_secs
    }

    /// Applies the staleness rule, consuming the snapshot.
    pub fn into_report(self, now_secs: u64) -> DriverStateReport {
        self.into_report_after(now_secs, STALE_AFTER_SECS)
    }

    /// Like [`DriverState::into_report`] with an explicit threshold.
    pub fn into_report_after(self, now_secs: u64, stale_after_secs: u64) -> DriverStateReport {
        if self.is_stale_after(now_secs, stale_after_secs) {
            DriverStateReport::Stale(StaleDriverState {
                device_license: self.device_license,
            })
        } else {
            DriverStateReport::Live(self)
        }
    }

    /// Decodes the typed license view, if the record has the expected shape.
    pub fn license(&self) -> Option<License> {
        License::from_value(&self.device_license)
    }

    /// Returns `true` when both brand and model are reported.
    pub fn device_connected(&self) -> bool {
        self.connected_device_brand.is_some() && self.connected_device_model.is_some()
    }
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// The reduced payload returned when the driver is not actively reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleDriverState {
    pub device_license: Value,
}

/// What a state read hands to callers.
///
/// Serialises untagged: a live report is the full object, a stale one is
/// just `{"device_license": ...}`.  Callers treat the missing fields as
/// "driver not actively reporting".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DriverStateReport {
    Live(DriverState),
    Stale(StaleDriverState),
}

impl DriverStateReport {
    pub fn is_live(&self) -> bool {
        matches!(self, DriverStateReport::Live(_))
    }

    pub fn device_license(&self) -> &Value {
        match self {
            DriverStateReport::Live(state) => &state.device_license,
            DriverStateReport::Stale(stale) => &stale.device_license,
        }
    }

    pub fn license(&self) -> Option<License> {
        License::from_value(self.device_license())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
