//! "Don't show again" use case.
//!
//! Hint keys are opaque strings chosen by the front end.  They are stored in
//! dismissal order and never duplicated.

use tracing::debug;

use crate::infrastructure::storage::settings::SettingsStore;
use crate::infrastructure::storage::StorageError;

/// Keys of dismissed hints.
pub fn dismissed_hints(settings: &SettingsStore) -> Vec<String> {
    settings.dont_show_again_keys().to_vec()
}

/// Returns `true` when `key` has been dismissed.
pub fn is_dismissed(settings: &SettingsStore, key: &str) -> bool {
    settings.dont_show_again_keys().iter().any(|k| k == key)
}

/// Dismisses `key` and returns the updated list.
///
/// # Errors
///
/// Propagates the settings flush failure.
pub fn dismiss_hint(settings: &mut SettingsStore, key: &str) -> Result<Vec<String>, StorageError> {
    let key = key.trim();
    if key.is_empty() {
        debug!("ignoring empty hint key");
        return Ok(dismissed_hints(settings));
    }
    settings.add_dont_show_again(key)?;
    Ok(dismissed_hints(settings))
}

/// Restores every hint.
///
/// # Errors
///
/// Propagates the settings flush failure.
pub fn reset_hints(settings: &mut SettingsStore) -> Result<(), StorageError> {
    settings.reset_dont_show_again()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
