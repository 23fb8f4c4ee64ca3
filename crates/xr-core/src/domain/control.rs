//! Control flags: transient commands signalled to the driver.
//!
//! The driver polls a write-only channel for these.  Nothing is read back,
//! so validation happens here, at the boundary, before anything is written.
//! A bad entry is dropped and reported; its valid siblings still go out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::codec;

pub const FLAG_RECENTER_SCREEN: &str = "recenter_screen";
pub const FLAG_RECALIBRATE: &str = "recalibrate";
pub const FLAG_REFRESH_DEVICE_LICENSE: &str = "refresh_device_license";
pub const FLAG_SBS_MODE: &str = "sbs_mode";
pub const FLAG_REQUEST_FEATURES: &str = "request_features";

/// Boolean flags.
pub const BOOLEAN_FLAGS: [&str; 3] = [
    FLAG_RECENTER_SCREEN,
    FLAG_RECALIBRATE,
    FLAG_REFRESH_DEVICE_LICENSE,
];

/// Supporter-tier features requested from the driver at startup.
pub const SUPPORTER_TIER_FEATURES: [&str; 2] = ["sbs", "smooth_follow"];

/// Side-by-side mode command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SbsModeControl {
    Unset,
    Enable,
    Disable,
}

impl SbsModeControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            SbsModeControl::Unset => "unset",
            SbsModeControl::Enable => "enable",
            SbsModeControl::Disable => "disable",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "unset" => Some(SbsModeControl::Unset),
            "enable" => Some(SbsModeControl::Enable),
            "disable" => Some(SbsModeControl::Disable),
            _ => None,
        }
    }
}

/// Typed command set for Rust callers.  Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recenter_screen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recalibrate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_device_license: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbs_mode: Option<SbsModeControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_features: Option<Vec<String>>,
}

impl ControlFlags {
    /// The command sent once at startup asking for supporter-tier features.
    pub fn request_supporter_features() -> Self {
        Self {
            request_features: Some(SUPPORTER_TIER_FEATURES.iter().map(|f| f.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Converts to the loosely-typed map the channel validates.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// One flag that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedFlag {
    pub key: String,
    pub value: Value,
    pub reason: &'static str,
}

/// Outcome of validating a flag map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatedFlags {
    /// Accepted `(key, rendered value)` pairs, in map order.
    pub accepted: Vec<(String, String)>,
    pub rejected: Vec<RejectedFlag>,
}

impl ValidatedFlags {
    /// Renders the accepted flags as channel lines.
    pub fn to_text(&self) -> String {
        self.accepted
            .iter()
            .map(|(key, value)| codec::render_line(key, value))
            .collect()
    }
}

/// Validates one flag, returning its rendered value or the rejection reason.
fn validate_flag(key: &str, value: &Value) -> Result<String, &'static str> {
    if BOOLEAN_FLAGS.iter().any(|flag| *flag == key) {
        return value
            .as_bool()
            .map(|b| codec::render_bool(b).to_string())
            .ok_or("expected a boolean");
    }

    match key {
        FLAG_SBS_MODE => value
            .as_str()
            .and_then(SbsModeControl::parse)
            .map(|mode| mode.as_str().to_string())
            .ok_or("expected one of unset, enable, disable"),
        FLAG_REQUEST_FEATURES => {
            let features = value
                .as_array()
                .and_then(|items| {
                    items
                        .iter()
                        .map(|item| item.as_str().map(|s| s.to_lowercase()))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or("expected a list of strings")?;
            if !features.iter().all(|feature| codec::is_list_element(feature)) {
                return Err("feature names must be single-line and free of ','");
            }
            Ok(codec::render_list(&features))
        }
        _ => Err("unrecognised flag"),
    }
}

/// Filters a loosely-typed flag map down to the recognised vocabulary.
pub fn validate_flags(flags: &Map<String, Value>) -> ValidatedFlags {
    let mut result = ValidatedFlags::default();
    for (key, value) in flags {
        match validate_flag(key, value) {
            Ok(rendered) => result.accepted.push((key.clone(), rendered)),
            Err(reason) => result.rejected.push(RejectedFlag {
                key: key.clone(),
                value: value.clone(),
                reason,
            }),
        }
    }
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
