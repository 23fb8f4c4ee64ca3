//! Line codec for the plain-text `key=value` channel format.
//!
//! All three files exchanged with the driver (the persisted config, the
//! control-flag channel and the driver-state channel) share one format:
//!
//! ```text
//! disabled=false
//! output_mode=external_only
//! external_mode=virtual_display,some_driver_mode
//! display_zoom=1.0
//! ```
//!
//! - One entry per line, split on the **first** `=` (values may contain `=`).
//! - No quoting or escaping.
//! - Booleans are the literals `true` / `false`.
//! - Lists are comma-joined.
//!
//! # Scalar parsers
//!
//! The `parse_*` functions never fail.  Each one takes the raw text and a
//! fallback and returns the fallback when the text is empty or malformed.
//! This is what lets a reader skip a single bad line without losing the rest
//! of the file.

use thiserror::Error;

/// Separator between a key and its value.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Separator between list elements.
pub const LIST_SEPARATOR: char = ',';

/// Errors produced while splitting a channel line.
///
/// Readers never propagate these to their callers; they log the error and
/// move on to the next line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The line contains no `=`.
    #[error("line has no '=' separator: {line:?}")]
    MissingSeparator { line: String },

    /// The line starts with `=`.
    #[error("line has an empty key: {line:?}")]
    EmptyKey { line: String },
}

/// Splits one line into `(key, value)`.
///
/// Leading and trailing whitespace is trimmed from the line and from the
/// key.  Returns `Ok(None)` for blank lines.
///
/// # Errors
///
/// Returns [`CodecError::MissingSeparator`] or [`CodecError::EmptyKey`] for
/// lines that are not a valid entry.
pub fn split_line(line: &str) -> Result<Option<(&str, &str)>, CodecError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (key, value) = line
        .split_once(KEY_VALUE_SEPARATOR)
        .ok_or_else(|| CodecError::MissingSeparator {
            line: line.to_string(),
        })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(CodecError::EmptyKey {
            line: line.to_string(),
        });
    }

    Ok(Some((key, value.trim())))
}

/// Iterates over every non-blank line of `text`, yielding split entries.
pub fn entries(text: &str) -> impl Iterator<Item = Result<(&str, &str), CodecError>> {
    text.lines().filter_map(|line| split_line(line).transpose())
}

/// Renders one `key=value` line, including the trailing newline.
pub fn render_line(key: &str, value: &str) -> String {
    format!("{key}{KEY_VALUE_SEPARATOR}{value}\n")
}

/// Renders a boolean as the lowercase literal the driver expects.
pub fn render_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Renders a float so that integral values keep their decimal point (`1.0`).
pub fn render_float(value: f64) -> String {
    format!("{value:?}")
}

/// Renders a list as a comma-joined string.
pub fn render_list(values: &[String]) -> String {
    values.join(",")
}

/// Returns `true` when `value` fits on one line: no `\n` or `\r`.
///
/// There is no escaping, so a value that fails this check would be read back
/// as extra lines.
pub fn is_single_line(value: &str) -> bool {
    !value.contains(['\n', '\r'])
}

/// Returns `true` when `value` can be one list element: a single line with
/// no [`LIST_SEPARATOR`].
pub fn is_list_element(value: &str) -> bool {
    is_single_line(value) && !value.contains(LIST_SEPARATOR)
}

// ── Scalar parsers ────────────────────────────────────────────────────────────

/// Parses a boolean.
///
/// Empty input yields `default`.  Anything else is `true` only when it equals
/// `"true"` ignoring ASCII case, so `"yes"` or `"1"` parse as `false`.
pub fn parse_boolean(raw: &str, default: bool) -> bool {
    let raw = raw.trim();
    if raw.is_empty() {
        return default;
    }
    raw.eq_ignore_ascii_case("true")
}

/// Parses a signed integer, returning `default` on any failure.
pub fn parse_int(raw: &str, default: i64) -> i64 {
    raw.trim().parse().unwrap_or(default)
}

/// Parses a float, returning `default` on any failure.
pub fn parse_float(raw: &str, default: f64) -> f64 {
    raw.trim().parse().unwrap_or(default)
}

/// Returns `raw` as an owned string, or `default` when it is empty.
pub fn parse_string(raw: &str, default: &str) -> String {
    if raw.is_empty() {
        default.to_string()
    } else {
        raw.to_string()
    }
}

/// Splits a comma-joined list.
///
/// Elements are trimmed and empty elements dropped, so `"a,,b"` yields
/// `["a", "b"]`.  An input with no elements yields `default`.
pub fn parse_array(raw: &str, default: &[String]) -> Vec<String> {
    let items: Vec<String> = raw
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        default.to_vec()
    } else {
        items
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
