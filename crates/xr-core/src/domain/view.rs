//! Translation between the driver config and the UI's headset-mode view.
//!
//! The UI offers four mutually exclusive headset modes.  The driver has no
//! such field: a mode is spread over `disabled`, `output_mode` and
//! `external_mode`, and those fields overlap.  This module derives the view
//! from a [`Config`] and maps a submitted view back onto config fields.
//!
//! # Managed and unmanaged external modes (for beginners)
//!
//! `external_mode` is a list.  This system only ever sets three values in it,
//! the *managed* modes `virtual_display`, `sideview` and `none`.  The driver
//! (or other tools) may add further entries; those are *unmanaged* and must be
//! carried through a mode change untouched, except where a transition
//! explicitly replaces the list.
//!
//! ```text
//! Config ──config_to_headset_mode──▶ HeadsetMode ──headset_mode_to_config──▶ ModeFields
//!   ▲                                                                          │
//!   └──────────────────────────── apply_view (merge) ◀──────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::{Config, ConfigValue, KEY_DISABLED, KEY_EXTERNAL_MODE, KEY_OUTPUT_MODE};

/// `output_mode` value for mouse-look.
pub const OUTPUT_MODE_MOUSE: &str = "mouse";
/// `output_mode` value for joystick emulation.
pub const OUTPUT_MODE_JOYSTICK: &str = "joystick";
/// `output_mode` value that hands all output to the external modes.
pub const OUTPUT_MODE_EXTERNAL_ONLY: &str = "external_only";

/// Output modes that mean "VR-Lite".
pub const VR_LITE_OUTPUT_MODES: [&str; 2] = [OUTPUT_MODE_MOUSE, OUTPUT_MODE_JOYSTICK];

pub const EXTERNAL_MODE_VIRTUAL_DISPLAY: &str = "virtual_display";
pub const EXTERNAL_MODE_SIDEVIEW: &str = "sideview";
pub const EXTERNAL_MODE_NONE: &str = "none";

/// Managed external modes, in the priority order used when deriving the view.
pub const MANAGED_EXTERNAL_MODES: [&str; 3] = [
    EXTERNAL_MODE_VIRTUAL_DISPLAY,
    EXTERNAL_MODE_SIDEVIEW,
    EXTERNAL_MODE_NONE,
];

/// The UI-facing headset mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadsetMode {
    Disabled,
    VirtualDisplay,
    VrLite,
    Sideview,
}

impl HeadsetMode {
    pub const ALL: [HeadsetMode; 4] = [
        HeadsetMode::Disabled,
        HeadsetMode::VirtualDisplay,
        HeadsetMode::VrLite,
        HeadsetMode::Sideview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadsetMode::Disabled => "disabled",
            HeadsetMode::VirtualDisplay => "virtual_display",
            HeadsetMode::VrLite => "vr_lite",
            HeadsetMode::Sideview => "sideview",
        }
    }
}

impl fmt::Display for HeadsetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeadsetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HeadsetMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown headset mode: {s}"))
    }
}

/// Derived view; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub headset_mode: HeadsetMode,
    pub is_joystick_mode: bool,
}

impl ViewModel {
    /// Computes the view for `config`.  An absent config is `disabled`.
    pub fn from_config(config: Option<&Config>) -> Self {
        Self {
            headset_mode: config_to_headset_mode(config),
            is_joystick_mode: config
                .map(|c| c.output_mode() == OUTPUT_MODE_JOYSTICK)
                .unwrap_or(false),
        }
    }
}

/// A config together with its derived view, as handed to the UI.
///
/// The two parts are only combined here, at the serialisation boundary:
/// `{ ...config fields, "ui_view": { "headset_mode": ..., "is_joystick_mode": ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigWithView {
    #[serde(flatten)]
    pub config: Config,
    pub ui_view: ViewModel,
}

impl ConfigWithView {
    pub fn new(config: Config) -> Self {
        let ui_view = ViewModel::from_config(Some(&config));
        Self { config, ui_view }
    }
}

/// A payload submitted by the UI: raw config fields plus an optional view.
///
/// Without a view the raw fields are persisted as given.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfigSubmission {
    #[serde(flatten)]
    pub config: Config,
    #[serde(default)]
    pub ui_view: Option<ViewModel>,
}

/// Returns `true` for `virtual_display`, `sideview` and `none`.
pub fn is_managed_external_mode(mode: &str) -> bool {
    MANAGED_EXTERNAL_MODES.iter().any(|managed| *managed == mode)
}

/// Filters `modes` down to the entries this system does not manage.
pub fn unmanaged_external_modes(modes: &[String]) -> Vec<String> {
    modes
        .iter()
        .filter(|mode| !is_managed_external_mode(mode))
        .cloned()
        .collect()
}

/// Derives the headset mode from a config.
///
/// 1. absent config or `disabled` → `Disabled`
/// 2. `output_mode` is `mouse` or `joystick` → `VrLite`
/// 3. first managed mode found in `external_mode`, by priority; `none` or
///    nothing found → `Disabled`
pub fn config_to_headset_mode(config: Option<&Config>) -> HeadsetMode {
    let Some(config) = config else {
        return HeadsetMode::Disabled;
    };
    if config.disabled() {
        return HeadsetMode::Disabled;
    }
    let output_mode = config.output_mode();
    if VR_LITE_OUTPUT_MODES.iter().any(|vr_lite| *vr_lite == output_mode) {
        return HeadsetMode::VrLite;
    }

    let external = config.external_modes();
    let first_managed = MANAGED_EXTERNAL_MODES
        .into_iter()
        .find(|managed| external.iter().any(|mode| mode == managed));

    match first_managed {
        Some(EXTERNAL_MODE_VIRTUAL_DISPLAY) => HeadsetMode::VirtualDisplay,
        Some(EXTERNAL_MODE_SIDEVIEW) => HeadsetMode::Sideview,
        _ => HeadsetMode::Disabled,
    }
}

/// Config fields produced by [`headset_mode_to_config`].
///
/// `None` means "leave the submitted value alone".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeFields {
    pub disabled: Option<bool>,
    pub output_mode: String,
    pub external_mode: Option<Vec<String>>,
}

/// Maps a headset mode back onto driver config fields.
///
/// Unmanaged entries of `old_external_modes` survive a `VrLite` transition
/// (the list is not touched) and a `Disabled` transition (they become the
/// whole list, or `[none]` if there are none).  `VirtualDisplay` and
/// `Sideview` replace the list outright, dropping unmanaged entries.
pub fn headset_mode_to_config(
    mode: HeadsetMode,
    is_joystick_mode: bool,
    old_external_modes: &[String],
) -> ModeFields {
    let unmanaged = unmanaged_external_modes(old_external_modes);

    match mode {
        // TODO: append `unmanaged` here once the driver supports running a
        // managed mode alongside driver-specific ones.
        HeadsetMode::VirtualDisplay => ModeFields {
            disabled: Some(false),
            output_mode: OUTPUT_MODE_EXTERNAL_ONLY.to_string(),
            external_mode: Some(vec![EXTERNAL_MODE_VIRTUAL_DISPLAY.to_string()]),
        },
        HeadsetMode::VrLite => ModeFields {
            disabled: Some(false),
            output_mode: if is_joystick_mode {
                OUTPUT_MODE_JOYSTICK
            } else {
                OUTPUT_MODE_MOUSE
            }
            .to_string(),
            external_mode: None,
        },
        HeadsetMode::Sideview => ModeFields {
            disabled: Some(false),
            output_mode: OUTPUT_MODE_EXTERNAL_ONLY.to_string(),
            external_mode: Some(vec![EXTERNAL_MODE_SIDEVIEW.to_string()]),
        },
        HeadsetMode::Disabled => ModeFields {
            disabled: None,
            output_mode: OUTPUT_MODE_EXTERNAL_ONLY.to_string(),
            external_mode: Some(if unmanaged.is_empty() {
                vec![EXTERNAL_MODE_NONE.to_string()]
            } else {
                unmanaged
            }),
        },
    }
}

/// Merges the mapping for `view` over `config`.
///
/// The mapping wins on `output_mode`, `disabled` and `external_mode`; every
/// other field keeps the submitted value.
pub fn apply_view(config: &mut Config, view: &ViewModel, old_external_modes: &[String]) {
    let fields = headset_mode_to_config(view.headset_mode, view.is_joystick_mode, old_external_modes);

    // Kinds match the schema. Carried-over modes come from a validated config,
    // so these cannot fail.
    if let Some(disabled) = fields.disabled {
        let _ = config.set(KEY_DISABLED, ConfigValue::Bool(disabled));
    }
    let _ = config.set(KEY_OUTPUT_MODE, ConfigValue::Text(fields.output_mode));
    if let Some(external_mode) = fields.external_mode {
        let _ = config.set(KEY_EXTERNAL_MODE, ConfigValue::List(external_mode));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config_with(disabled: bool, output_mode: &str, external: &[&str]) -> Config {
        let mut cfg = Config::default();
        cfg.set(KEY_DISABLED, ConfigValue::Bool(disabled)).unwrap();
        cfg.set(KEY_OUTPUT_MODE, ConfigValue::Text(output_mode.into())).unwrap();
        cfg.set(KEY_EXTERNAL_MODE, ConfigValue::List(strings(external))).unwrap();
        cfg
    }

    // ── config_to_headset_mode ────────────────────────────────────────────────

    #[test]
    fn test_absent_config_is_disabled() {
        assert_eq!(config_to_headset_mode(None), HeadsetMode::Disabled);
    }

    #[test]
    fn test_disabled_flag_wins_over_everything() {
        let cfg = config_with(true, "mouse", &["virtual_display"]);
        assert_eq!(config_to_headset_mode(Some(&cfg)), HeadsetMode::Disabled);
    }

    #[test]
    fn test_mouse_and_joystick_output_are_vr_lite() {
        let mouse = config_with(false, "mouse", &["sideview"]);
        let joystick = config_with(false, "joystick", &["none"]);
        assert_eq!(config_to_headset_mode(Some(&mouse)), HeadsetMode::VrLite);
        assert_eq!(config_to_headset_mode(Some(&joystick)), HeadsetMode::VrLite);
    }

    #[test]
    fn test_external_modes_follow_priority_order() {
        // sideview appears first in the list, but virtual_display has priority
        let cfg = config_with(false, "external_only", &["custom", "sideview", "virtual_display"]);
        assert_eq!(config_to_headset_mode(Some(&cfg)), HeadsetMode::VirtualDisplay);
    }

    #[test]
    fn test_external_none_or_unmanaged_only_is_disabled() {
        let none = config_with(false, "external_only", &["none"]);
        let unmanaged = config_with(false, "external_only", &["custom"]);
        assert_eq!(config_to_headset_mode(Some(&none)), HeadsetMode::Disabled);
        assert_eq!(config_to_headset_mode(Some(&unmanaged)), HeadsetMode::Disabled);
    }

    #[test]
    fn test_view_model_reports_joystick_mode() {
        let cfg = config_with(false, "joystick", &["none"]);
        let view = ViewModel::from_config(Some(&cfg));
        assert_eq!(view.headset_mode, HeadsetMode::VrLite);
        assert!(view.is_joystick_mode);
    }

    // ── headset_mode_to_config ────────────────────────────────────────────────

    #[test]
    fn test_virtual_display_replaces_external_list() {
        // Arrange
        let old = strings(&["custom", "sideview"]);

        // Act
        let fields = headset_mode_to_config(HeadsetMode::VirtualDisplay, false, &old);

        // Assert
        assert_eq!(fields.disabled, Some(false));
        assert_eq!(fields.output_mode, "external_only");
        assert_eq!(fields.external_mode, Some(strings(&["virtual_display"])));
    }

    #[test]
    fn test_vr_lite_leaves_external_list_untouched() {
        let fields = headset_mode_to_config(HeadsetMode::VrLite, true, &strings(&["custom"]));
        assert_eq!(fields.output_mode, "joystick");
        assert_eq!(fields.disabled, Some(false));
        assert_eq!(fields.external_mode, None);
    }

    #[test]
    fn test_disabled_keeps_unmanaged_modes() {
        let fields =
            headset_mode_to_config(HeadsetMode::Disabled, false, &strings(&["sideview", "custom"]));
        assert_eq!(fields.external_mode, Some(strings(&["custom"])));
        assert_eq!(fields.output_mode, "external_only");
        assert_eq!(fields.disabled, None);
    }

    #[test]
    fn test_disabled_without_unmanaged_modes_writes_none() {
        let fields = headset_mode_to_config(HeadsetMode::Disabled, false, &strings(&["sideview"]));
        assert_eq!(fields.external_mode, Some(strings(&["none"])));
    }

    #[test]
    fn test_mode_round_trips_through_config() {
        // For every mode and joystick flag, mapping onto a config and deriving
        // the view again yields the same mode.
        let olds = [strings(&[]), strings(&["custom"]), strings(&["none", "custom"])];
        for mode in HeadsetMode::ALL {
            for joystick in [false, true] {
                for old in &olds {
                    let mut cfg = config_with(false, "mouse", &[]);
                    cfg.set(KEY_EXTERNAL_MODE, ConfigValue::List(old.clone())).unwrap();
                    let view = ViewModel { headset_mode: mode, is_joystick_mode: joystick };

                    apply_view(&mut cfg, &view, old);

                    assert_eq!(
                        config_to_headset_mode(Some(&cfg)),
                        mode,
                        "mode {mode} joystick {joystick} old {old:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_apply_view_preserves_unrelated_fields() {
        let mut cfg = Config::default();
        cfg.set("look_ahead", ConfigValue::Int(9)).unwrap();
        let view = ViewModel { headset_mode: HeadsetMode::Sideview, is_joystick_mode: false };

        apply_view(&mut cfg, &view, &[]);

        assert_eq!(cfg.get("look_ahead"), Some(&ConfigValue::Int(9)));
        assert!(!cfg.disabled());
        assert_eq!(cfg.external_modes(), ["sideview".to_string()]);
    }

    // ── Serialisation ─────────────────────────────────────────────────────────

    #[test]
    fn test_config_with_view_serializes_ui_view_alongside_fields() {
        let payload = ConfigWithView::new(Config::default());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["disabled"], serde_json::json!(true));
        assert_eq!(value["ui_view"]["headset_mode"], serde_json::json!("disabled"));
        assert_eq!(value["ui_view"]["is_joystick_mode"], serde_json::json!(false));
    }

    #[test]
    fn test_submission_deserializes_view_and_fields() {
        let json = serde_json::json!({
            "look_ahead": 6,
            "ui_view": { "headset_mode": "vr_lite", "is_joystick_mode": true }
        });

        let submission: ConfigSubmission = serde_json::from_value(json).unwrap();

        assert_eq!(submission.config.get("look_ahead"), Some(&ConfigValue::Int(6)));
        assert_eq!(
            submission.ui_view,
            Some(ViewModel { headset_mode: HeadsetMode::VrLite, is_joystick_mode: true })
        );
    }

    #[test]
    fn test_headset_mode_parses_from_str() {
        assert_eq!("vr_lite".parse::<HeadsetMode>(), Ok(HeadsetMode::VrLite));
        assert!("bogus".parse::<HeadsetMode>().is_err());
    }
}
