//! Typed driver configuration and the schema table that describes it.
//!
//! The driver reads a flat `key=value` file at startup.  Every key this
//! system understands is listed exactly once in [`CONFIG_SCHEMA`] together
//! with its default value; the default also decides which parser is used for
//! the key.  Reading, writing, JSON coercion and the CLI all iterate this one
//! table, so adding a field is a one-line change:
//!
//! ```ignore
//! FieldSpec { key: "new_field", default: FieldDefault::Bool(false) },
//! ```
//!
//! # Invariant
//!
//! A [`Config`] always holds a value for every schema key, and every value has
//! the kind its schema default has.  The only constructors are
//! [`Config::default`] (all defaults) and mutation through [`Config::set`] /
//! [`Config::apply_raw`], both of which enforce the kind.

use std::collections::BTreeMap;

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::codec::{self, CodecError};

/// Key holding the current output mode (`mouse`, `joystick`, `external_only`).
pub const KEY_OUTPUT_MODE: &str = "output_mode";
/// Key holding the ordered list of active external modes.
pub const KEY_EXTERNAL_MODE: &str = "external_mode";
/// Key holding the global kill switch.
pub const KEY_DISABLED: &str = "disabled";
/// Transient marker some callers attach to a submitted payload; never persisted.
pub const KEY_UPDATED_MARKER: &str = "updated";

/// Error type for typed config mutation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The key is not in [`CONFIG_SCHEMA`].
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// The value's kind does not match the schema default's kind.
    #[error("config key {key} expects a {expected} value")]
    KindMismatch { key: String, expected: &'static str },

    /// The value would not read back as itself from the text format.
    #[error("config key {key} rejected: {reason}")]
    Unrenderable { key: String, reason: &'static str },
}

// ── Values ────────────────────────────────────────────────────────────────────

/// One typed config value.
///
/// Serialises untagged so a `Config` renders as a plain JSON object
/// (`{"disabled": false, "display_zoom": 1.0, ...}`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders the value in the on-disk text format.
    pub fn render(&self) -> String {
        match self {
            ConfigValue::Bool(b) => codec::render_bool(*b).to_string(),
            ConfigValue::Int(i) => i.to_string(),
            ConfigValue::Float(f) => codec::render_float(*f),
            ConfigValue::Text(s) => s.clone(),
            ConfigValue::List(items) => codec::render_list(items),
        }
    }

    /// Checks that [`ConfigValue::render`] yields a single line that parses
    /// back to the same value.
    ///
    /// # Errors
    ///
    /// Returns the reason when a text value spans lines or a list element
    /// spans lines or contains the list separator.
    pub fn check_renderable(&self) -> Result<(), &'static str> {
        match self {
            ConfigValue::Text(s) if !codec::is_single_line(s) => Err("value contains a line break"),
            ConfigValue::List(items) if items.iter().any(|item| !codec::is_single_line(item)) => {
                Err("list element contains a line break")
            }
            ConfigValue::List(items) if items.iter().any(|item| !codec::is_list_element(item)) => {
                Err("list element contains ','")
            }
            _ => Ok(()),
        }
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Default value of a schema field.  Its variant selects the field's parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'static str),
    List(&'static [&'static str]),
}

impl FieldDefault {
    /// Human-readable kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldDefault::Bool(_) => "boolean",
            FieldDefault::Int(_) => "integer",
            FieldDefault::Float(_) => "float",
            FieldDefault::Text(_) => "string",
            FieldDefault::List(_) => "list",
        }
    }

    /// Materialises the default as an owned [`ConfigValue`].
    pub fn value(&self) -> ConfigValue {
        match *self {
            FieldDefault::Bool(b) => ConfigValue::Bool(b),
            FieldDefault::Int(i) => ConfigValue::Int(i),
            FieldDefault::Float(f) => ConfigValue::Float(f),
            FieldDefault::Text(s) => ConfigValue::Text(s.to_string()),
            FieldDefault::List(items) => {
                ConfigValue::List(items.iter().map(|s| s.to_string()).collect())
            }
        }
    }

    /// Returns `true` when `value` has this field's kind.
    pub fn matches(&self, value: &ConfigValue) -> bool {
        matches!(
            (self, value),
            (FieldDefault::Bool(_), ConfigValue::Bool(_))
                | (FieldDefault::Int(_), ConfigValue::Int(_))
                | (FieldDefault::Float(_), ConfigValue::Float(_))
                | (FieldDefault::Text(_), ConfigValue::Text(_))
                | (FieldDefault::List(_), ConfigValue::List(_))
        )
    }

    /// Parses raw text for this field.
    ///
    /// `current` is the value the field holds right now; a malformed `raw`
    /// falls back to it rather than to the schema default, so the last good
    /// value seen in a file wins.
    pub fn parse(&self, raw: &str, current: &ConfigValue) -> ConfigValue {
        let fallback = if self.matches(current) {
            current.clone()
        } else {
            self.value()
        };

        match (self, fallback) {
            (FieldDefault::Bool(_), ConfigValue::Bool(cur)) => {
                ConfigValue::Bool(codec::parse_boolean(raw, cur))
            }
            (FieldDefault::Int(_), ConfigValue::Int(cur)) => {
                ConfigValue::Int(codec::parse_int(raw, cur))
            }
            (FieldDefault::Float(_), ConfigValue::Float(cur)) => {
                ConfigValue::Float(codec::parse_float(raw, cur))
            }
            (FieldDefault::Text(_), ConfigValue::Text(cur)) => {
                ConfigValue::Text(codec::parse_string(raw, &cur))
            }
            (FieldDefault::List(_), ConfigValue::List(cur)) => {
                ConfigValue::List(codec::parse_array(raw, &cur))
            }
            (_, other) => other,
        }
    }

    /// Coerces a JSON value submitted by the UI into this field's kind.
    ///
    /// Strings are run through the text parser so `"true"` and `"0.5"` are
    /// accepted for boolean and float fields.  A single string is accepted for
    /// a list field (older front-ends send `external_mode` as a scalar).
    /// Returns `None` when the value cannot represent this kind or would not
    /// survive a write and re-read (see [`ConfigValue::check_renderable`]).
    pub fn coerce_json(&self, value: &Value, current: &ConfigValue) -> Option<ConfigValue> {
        let coerced = match (self, value) {
            (_, Value::String(raw)) => Some(self.parse(raw, current)),
            (FieldDefault::Bool(_), Value::Bool(b)) => Some(ConfigValue::Bool(*b)),
            (FieldDefault::Int(_), Value::Number(n)) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && (I64_MIN_F64..I64_MAX_F64).contains(f))
                        .map(|f| f as i64)
                })
                .map(ConfigValue::Int),
            (FieldDefault::Float(_), Value::Number(n)) => n.as_f64().map(ConfigValue::Float),
            (FieldDefault::List(_), Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(ConfigValue::List),
            _ => None,
        }?;
        coerced.check_renderable().ok().map(|()| coerced)
    }
}

// Bounds of the floats that convert to `i64` without saturating. The upper
// bound is 2^63, which is excluded.
const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_MAX_F64: f64 = i64::MAX as f64;

/// One row of the schema table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub default: FieldDefault,
}

/// Every config key this system understands, in on-disk order.
pub static CONFIG_SCHEMA: &[FieldSpec] = &[
    FieldSpec { key: KEY_DISABLED, default: FieldDefault::Bool(true) },
    FieldSpec { key: KEY_OUTPUT_MODE, default: FieldDefault::Text("mouse") },
    FieldSpec { key: KEY_EXTERNAL_MODE, default: FieldDefault::List(&["none"]) },
    FieldSpec { key: "mouse_sensitivity", default: FieldDefault::Int(30) },
    FieldSpec { key: "display_zoom", default: FieldDefault::Float(1.0) },
    FieldSpec { key: "look_ahead", default: FieldDefault::Int(0) },
    FieldSpec { key: "sbs_display_size", default: FieldDefault::Float(1.0) },
    FieldSpec { key: "sbs_display_distance", default: FieldDefault::Float(1.0) },
    FieldSpec { key: "sbs_content", default: FieldDefault::Bool(false) },
    FieldSpec { key: "sbs_mode_stretched", default: FieldDefault::Bool(false) },
    FieldSpec { key: "sideview_position", default: FieldDefault::Text("top_left") },
    FieldSpec { key: "sideview_display_size", default: FieldDefault::Float(1.0) },
    FieldSpec { key: "virtual_display_smooth_follow_enabled", default: FieldDefault::Bool(false) },
    FieldSpec { key: "sideview_smooth_follow_enabled", default: FieldDefault::Bool(false) },
    FieldSpec { key: "debug", default: FieldDefault::List(&[]) },
];

/// Looks up a key in [`CONFIG_SCHEMA`].
pub fn field_spec(key: &str) -> Option<&'static FieldSpec> {
    CONFIG_SCHEMA.iter().find(|spec| spec.key == key)
}

// ── Config ────────────────────────────────────────────────────────────────────

/// The driver configuration: one typed value per schema key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Config {
    values: BTreeMap<&'static str, ConfigValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            values: CONFIG_SCHEMA
                .iter()
                .map(|spec| (spec.key, spec.default.value()))
                .collect(),
        }
    }
}

impl Config {
    /// Parses the text of a config file on top of the schema defaults.
    ///
    /// Unknown keys and malformed lines are logged and skipped.
    pub fn from_text(text: &str) -> Self {
        let mut config = Config::default();
        for entry in codec::entries(text) {
            match entry {
                Ok((key, raw)) => match config.apply_raw(key, raw) {
                    Ok(()) => {}
                    Err(ConfigError::UnknownKey(_)) => debug!("skipping unknown config key {key}"),
                    Err(e) => warn!("skipping config line {key}={raw}: {e}"),
                },
                Err(e) => warn!("skipping malformed config line: {e}"),
            }
        }
        config
    }

    /// Serialises every schema key, in schema order, to the on-disk format.
    pub fn to_text(&self) -> String {
        CONFIG_SCHEMA
            .iter()
            .filter_map(|spec| {
                self.values
                    .get(spec.key)
                    .map(|value| codec::render_line(spec.key, &value.render()))
            })
            .collect()
    }

    /// Returns the value stored for `key`, if the key is known.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Replaces the value for `key`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`] for keys outside the schema,
    /// [`ConfigError::KindMismatch`] when `value` has the wrong kind and
    /// [`ConfigError::Unrenderable`] when it would not read back unchanged.
    pub fn set(&mut self, key: &str, value: ConfigValue) -> Result<(), ConfigError> {
        let spec = field_spec(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        if !spec.default.matches(&value) {
            return Err(ConfigError::KindMismatch {
                key: key.to_string(),
                expected: spec.default.kind_name(),
            });
        }
        value
            .check_renderable()
            .map_err(|reason| ConfigError::Unrenderable { key: key.to_string(), reason })?;
        self.values.insert(spec.key, value);
        Ok(())
    }

    /// Parses `raw` with the key's schema parser and stores the result.
    ///
    /// Malformed text keeps the current value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`] for keys outside the schema and
    /// [`ConfigError::Unrenderable`] when `raw` spans lines.
    pub fn apply_raw(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let spec = field_spec(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let current = self.values.get(spec.key).cloned().unwrap_or_else(|| spec.default.value());
        let parsed = spec.default.parse(raw, &current);
        self.set(spec.key, parsed)
    }

    /// Parses a `key=value` assignment (as typed on the command line).
    ///
    /// # Errors
    ///
    /// Returns the codec error text for a line without `=`, or the
    /// [`ConfigError`] from [`Config::apply_raw`].
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), String> {
        match codec::split_line(assignment) {
            Ok(Some((key, raw))) => self.apply_raw(key, raw).map_err(|e| e.to_string()),
            Ok(None) => Err(CodecError::MissingSeparator { line: assignment.to_string() }.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_text)
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(ConfigValue::as_list)
    }

    pub fn disabled(&self) -> bool {
        self.bool(KEY_DISABLED).unwrap_or(true)
    }

    pub fn output_mode(&self) -> &str {
        self.text(KEY_OUTPUT_MODE).unwrap_or_default()
    }

    pub fn external_modes(&self) -> &[String] {
        self.list(KEY_EXTERNAL_MODE).unwrap_or_default()
    }

    /// Iterates over `(key, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ConfigValue)> {
        CONFIG_SCHEMA
            .iter()
            .filter_map(|spec| self.values.get(spec.key).map(|value| (spec.key, value)))
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl From<Map<String, Value>> for Config {
    /// Builds a config from a loosely-typed JSON object.
    ///
    /// Missing keys keep their defaults.  Unknown keys (including the
    /// transient `updated` marker) are ignored.  Values that cannot be coerced
    /// to their field's kind, or that would not survive a write and re-read,
    /// keep the default with a warning.
    fn from(map: Map<String, Value>) -> Self {
        let mut config = Config::default();
        for (key, value) in &map {
            let Some(spec) = field_spec(key) else {
                if key != KEY_UPDATED_MARKER {
                    debug!("ignoring unknown config key {key}");
                }
                continue;
            };
            let current = spec.default.value();
            match spec.default.coerce_json(value, &current) {
                Some(coerced) => {
                    config.values.insert(spec.key, coerced);
                }
                None => warn!(
                    "ignoring {key}={value}: expected a single-line {} value",
                    spec.default.kind_name()
                ),
            }
        }
        config
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_contains_every_schema_key() {
        // Arrange / Act
        let cfg = Config::default();

        // Assert
        for spec in CONFIG_SCHEMA {
            let value = cfg.get(spec.key).expect("schema key must be present");
            assert!(spec.default.matches(value), "{} has wrong kind", spec.key);
        }
    }

    #[test]
    fn test_schema_keys_are_unique() {
        let mut keys: Vec<_> = CONFIG_SCHEMA.iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), CONFIG_SCHEMA.len());
    }

    #[test]
    fn test_default_values_match_driver_defaults() {
        let cfg = Config::default();
        assert!(cfg.disabled());
        assert_eq!(cfg.output_mode(), "mouse");
        assert_eq!(cfg.external_modes(), ["none".to_string()]);
        assert_eq!(cfg.get("mouse_sensitivity"), Some(&ConfigValue::Int(30)));
        assert_eq!(cfg.get("display_zoom"), Some(&ConfigValue::Float(1.0)));
    }

    #[test]
    fn test_from_text_parses_known_keys() {
        // Arrange
        let text = "disabled=false\noutput_mode=joystick\nexternal_mode=sideview,custom\nlook_ahead=12\n";

        // Act
        let cfg = Config::from_text(text);

        // Assert
        assert!(!cfg.disabled());
        assert_eq!(cfg.output_mode(), "joystick");
        assert_eq!(cfg.external_modes(), ["sideview".to_string(), "custom".to_string()]);
        assert_eq!(cfg.get("look_ahead"), Some(&ConfigValue::Int(12)));
    }

    #[test]
    fn test_from_text_malformed_value_keeps_default() {
        let cfg = Config::from_text("mouse_sensitivity=abc\ndisplay_zoom=1.5\n");
        assert_eq!(cfg.get("mouse_sensitivity"), Some(&ConfigValue::Int(30)));
        assert_eq!(cfg.get("display_zoom"), Some(&ConfigValue::Float(1.5)));
    }

    #[test]
    fn test_from_text_malformed_value_keeps_last_good_value() {
        // The second assignment is malformed; the first one must survive.
        let cfg = Config::from_text("mouse_sensitivity=45\nmouse_sensitivity=abc\n");
        assert_eq!(cfg.get("mouse_sensitivity"), Some(&ConfigValue::Int(45)));
    }

    #[test]
    fn test_from_text_skips_unknown_and_garbage_lines() {
        let cfg = Config::from_text("mystery=1\nnot a line\ndisabled=false\n");
        assert!(!cfg.disabled());
        assert!(cfg.get("mystery").is_none());
    }

    #[test]
    fn test_to_text_renders_in_schema_order() {
        // Arrange
        let cfg = Config::default();

        // Act
        let text = cfg.to_text();
        let keys: Vec<&str> = text.lines().map(|l| l.split('=').next().unwrap()).collect();

        // Assert
        let schema_keys: Vec<&str> = CONFIG_SCHEMA.iter().map(|s| s.key).collect();
        assert_eq!(keys, schema_keys);
        assert!(text.starts_with("disabled=true\n"));
        assert!(text.contains("display_zoom=1.0\n"));
        assert!(text.contains("debug=\n"));
    }

    #[test]
    fn test_text_round_trip_preserves_config() {
        let mut cfg = Config::default();
        cfg.set("external_mode", ConfigValue::List(vec!["sideview".into(), "custom".into()]))
            .unwrap();
        cfg.set("display_zoom", ConfigValue::Float(0.5)).unwrap();

        let restored = Config::from_text(&cfg.to_text());

        assert_eq!(restored, cfg);
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set("nope", ConfigValue::Bool(true));
        assert_eq!(result, Err(ConfigError::UnknownKey("nope".into())));
    }

    #[test]
    fn test_set_rejects_wrong_kind() {
        let mut cfg = Config::default();
        let result = cfg.set("disabled", ConfigValue::Int(1));
        assert!(matches!(result, Err(ConfigError::KindMismatch { .. })));
        assert!(cfg.disabled());
    }

    #[test]
    fn test_apply_assignment_parses_with_schema_parser() {
        let mut cfg = Config::default();
        cfg.apply_assignment("sbs_content=TRUE").unwrap();
        assert_eq!(cfg.bool("sbs_content"), Some(true));
        assert!(cfg.apply_assignment("no_separator").is_err());
    }

    #[test]
    fn test_from_json_map_coerces_values() {
        // Arrange
        let payload = json!({
            "disabled": false,
            "mouse_sensitivity": 40.0,
            "display_zoom": 2,
            "external_mode": "sideview",
            "sbs_content": "true",
            "updated": 1700000000,
            "unknown": "x"
        });

        // Act
        let cfg: Config = serde_json::from_value(payload).unwrap();

        // Assert
        assert!(!cfg.disabled());
        assert_eq!(cfg.get("mouse_sensitivity"), Some(&ConfigValue::Int(40)));
        assert_eq!(cfg.get("display_zoom"), Some(&ConfigValue::Float(2.0)));
        assert_eq!(cfg.external_modes(), ["sideview".to_string()]);
        assert_eq!(cfg.bool("sbs_content"), Some(true));
        assert!(cfg.get("updated").is_none());
    }

    #[test]
    fn test_from_json_map_rejects_wrong_kind_and_keeps_default() {
        let cfg: Config = serde_json::from_value(json!({ "look_ahead": [1, 2] })).unwrap();
        assert_eq!(cfg.get("look_ahead"), Some(&ConfigValue::Int(0)));
    }

    #[test]
    fn test_set_rejects_text_with_line_break() {
        // Arrange
        let mut cfg = Config::default();

        // Act
        let result = cfg.set(
            "sideview_position",
            ConfigValue::Text("center\ndisabled=false".into()),
        );

        // Assert
        assert!(matches!(result, Err(ConfigError::Unrenderable { .. })));
        assert_eq!(cfg.text("sideview_position"), Some("top_left"));
    }

    #[test]
    fn test_set_rejects_list_element_with_separator_or_line_break() {
        let mut cfg = Config::default();

        let comma = cfg.set("external_mode", ConfigValue::List(vec!["driver_a,driver_b".into()]));
        let newline = cfg.set("debug", ConfigValue::List(vec!["a\rb".into()]));

        assert!(matches!(comma, Err(ConfigError::Unrenderable { .. })));
        assert!(matches!(newline, Err(ConfigError::Unrenderable { .. })));
        assert_eq!(cfg.external_modes(), ["none".to_string()]);
    }

    #[test]
    fn test_from_json_map_drops_multiline_text_and_round_trips() {
        // Arrange
        let payload = json!({
            "disabled": true,
            "sideview_position": "center\ndisabled=false\noutput_mode=joystick"
        });

        // Act
        let cfg: Config = serde_json::from_value(payload).unwrap();
        let restored = Config::from_text(&cfg.to_text());

        // Assert
        assert_eq!(cfg.text("sideview_position"), Some("top_left"));
        assert!(cfg.disabled());
        assert_eq!(cfg.output_mode(), "mouse");
        assert_eq!(restored, cfg);
    }

    #[test]
    fn test_from_json_map_drops_list_element_with_separator() {
        // Arrange
        let payload = json!({
            "external_mode": ["driver_a,driver_b"],
            "debug": "sideview\nrecalibrate=true"
        });

        // Act
        let cfg: Config = serde_json::from_value(payload).unwrap();
        let restored = Config::from_text(&cfg.to_text());

        // Assert
        assert_eq!(cfg.external_modes(), ["none".to_string()]);
        assert_eq!(cfg.list("debug").map(<[String]>::len), Some(0));
        assert_eq!(restored, cfg);
    }

    #[test]
    fn test_from_json_map_rejects_out_of_range_integer() {
        // Arrange
        let payload = json!({
            "mouse_sensitivity": 1e20,
            "look_ahead": -1e20
        });

        // Act
        let cfg: Config = serde_json::from_value(payload).unwrap();

        // Assert
        assert_eq!(cfg.get("mouse_sensitivity"), Some(&ConfigValue::Int(30)));
        assert_eq!(cfg.get("look_ahead"), Some(&ConfigValue::Int(0)));
    }

    #[test]
    fn test_coerce_json_accepts_integral_float_in_range() {
        let spec = field_spec("mouse_sensitivity").unwrap();
        let current = spec.default.value();
        assert_eq!(spec.default.coerce_json(&json!(-45.0), &current), Some(ConfigValue::Int(-45)));
        assert_eq!(spec.default.coerce_json(&json!(9.3e18), &current), None);
        assert_eq!(spec.default.coerce_json(&json!(1.5), &current), None);
    }

    #[test]
    fn test_from_text_line_with_carriage_return_keeps_default() {
        // Arrange
        let text = "sideview_position=center\rdisabled=false\n";

        // Act
        let cfg = Config::from_text(text);

        // Assert
        assert_eq!(cfg.text("sideview_position"), Some("top_left"));
        assert!(cfg.disabled());
    }

    #[test]
    fn test_apply_assignment_rejects_line_break() {
        let mut cfg = Config::default();
        assert!(cfg.apply_assignment("output_mode=joystick\ndisabled=false").is_err());
        assert_eq!(cfg.output_mode(), "mouse");
        assert!(cfg.disabled());
    }

    #[test]
    fn test_serialize_config_as_flat_json_object() {
        let cfg = Config::default();
        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value["disabled"], json!(true));
        assert_eq!(value["external_mode"], json!(["none"]));
        assert_eq!(value["display_zoom"], json!(1.0));
    }
}
