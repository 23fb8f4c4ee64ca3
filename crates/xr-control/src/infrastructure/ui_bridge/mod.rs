//! Front-end bridge: exposes the control-plane operations to a UI.
//!
//! Every operation takes the shared [`AppState`] and returns a
//! [`CommandResult<T>`].  The front end (or the CLI) is the only consumer of
//! this module; the application layer never imports it.
//!
//! # Payloads
//!
//! Config and control-flag payloads arrive as loosely-typed JSON.  They are
//! validated here, at the boundary: unknown or ill-typed config fields keep
//! their schema default, bad control flags are dropped and reported.
//!
//! # `CommandResult<T>` wrapper
//!
//! All operations return `CommandResult<T>` rather than `Result<T, E>`, so
//! every response has the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};
use xr_core::domain::control::SUPPORTER_TIER_FEATURES;
use xr_core::domain::license::{feature_enabled, time_remaining_text, trial_time_remaining};
use xr_core::{ConfigSubmission, ConfigWithView, ControlFlags, DriverStateReport};

use crate::application::{manage_driver, preferences};
use crate::infrastructure::driver_service::{DriverService, ProcessDriverService};
use crate::infrastructure::ipc::control_channel::{ControlFlagChannel, ControlFlagReport};
use crate::infrastructure::ipc::state_channel::{unix_now, DriverStateReader};
use crate::infrastructure::storage::config_file::ConfigStore;
use crate::infrastructure::storage::paths::{RetryPolicy, ServiceConfig};
use crate::infrastructure::storage::settings::SettingsStore;

// ── Shared application state ──────────────────────────────────────────────────

/// Progress of the startup install check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InstallStatus {
    pub installing: bool,
    pub installed: bool,
}

/// State shared between bridge operations.
///
/// The channel handles are stateless path holders.  The settings store and
/// the install status are behind async mutexes; config writes are
/// serialised by `config_write` so two writers in this process cannot
/// interleave their read-before-write steps.
pub struct AppState {
    pub config_store: ConfigStore,
    pub control_channel: ControlFlagChannel,
    pub state_reader: DriverStateReader,
    pub settings: Mutex<SettingsStore>,
    pub driver: Arc<dyn DriverService>,
    pub install_status: Mutex<InstallStatus>,
    pub plugin_version: String,
    pub retry: RetryPolicy,
    config_write: Mutex<()>,
}

impl AppState {
    /// Builds the state with an injected driver service.
    pub fn with_driver(config: &ServiceConfig, driver: Arc<dyn DriverService>) -> Arc<Self> {
        Arc::new(Self {
            config_store: ConfigStore::new(config.channels.config_file.clone()),
            control_channel: ControlFlagChannel::new(config.channels.control_flags.clone()),
            state_reader: DriverStateReader::new(config.channels.driver_state.clone())
                .with_stale_after(config.stale_after_secs),
            settings: Mutex::new(SettingsStore::load_or_default(config.settings_file.clone())),
            driver,
            install_status: Mutex::new(InstallStatus::default()),
            plugin_version: config.plugin_version.clone(),
            retry: config.retry,
            config_write: Mutex::new(()),
        })
    }

    /// Builds the state with the process-backed driver service.
    pub fn new(config: &ServiceConfig) -> Arc<Self> {
        Self::with_driver(config, Arc::new(ProcessDriverService::from_config(config)))
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// License summary for the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LicenseDto {
    pub hardware_id: Option<String>,
    pub confirmed_token: Option<bool>,
    pub active_tier: Option<String>,
    /// Feature name to "usable right now".
    pub features: BTreeMap<String, bool>,
    pub trial_seconds_remaining: Option<i64>,
    pub trial_remaining_text: Option<String>,
}

/// Unified response wrapper used by every bridge operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// Returns the stored config with its headset-mode view.
pub async fn retrieve_config(state: Arc<AppState>) -> CommandResult<ConfigWithView> {
    CommandResult::ok(state.config_store.read())
}

/// Persists a config payload (`{...fields, "ui_view"?: {...}}`).
pub async fn write_config(state: Arc<AppState>, payload: Value) -> CommandResult<ConfigWithView> {
    if !payload.is_object() {
        return CommandResult::err("config payload must be a JSON object");
    }
    let submission: ConfigSubmission = match serde_json::from_value(payload) {
        Ok(submission) => submission,
        Err(e) => return CommandResult::err(format!("invalid config payload: {e}")),
    };

    let _guard = state.config_write.lock().await;
    match state.config_store.write(submission) {
        Ok(stored) => CommandResult::ok(stored),
        Err(e) => CommandResult::err(format!("failed to save config: {e}")),
    }
}

// ── Driver channels ───────────────────────────────────────────────────────────

/// Sends control flags to the driver.  Rejected entries are reported in the
/// result rather than failing the call.
pub async fn write_control_flags(
    state: Arc<AppState>,
    flags: Value,
) -> CommandResult<ControlFlagReport> {
    let Value::Object(flags) = flags else {
        return CommandResult::err("control flags must be a JSON object");
    };
    match state.control_channel.write(&flags) {
        Ok(report) => CommandResult::ok(report),
        Err(e) => CommandResult::err(format!("failed to send control flags: {e}")),
    }
}

/// Returns the driver state, reduced to the license when it is stale.
pub async fn retrieve_driver_state(state: Arc<AppState>) -> CommandResult<DriverStateReport> {
    CommandResult::ok(state.state_reader.read())
}

/// Summarises the device license published by the driver.
pub async fn retrieve_license(state: Arc<AppState>) -> CommandResult<LicenseDto> {
    let report = state.state_reader.read();
    CommandResult::ok(license_summary(&report, unix_now() as i64))
}

fn license_summary(report: &DriverStateReport, now_secs: i64) -> LicenseDto {
    let Some(license) = report.license() else {
        return LicenseDto::default();
    };

    let mut features: BTreeMap<String, bool> = SUPPORTER_TIER_FEATURES
        .iter()
        .map(|name| (name.to_string(), false))
        .collect();
    for name in license.features.keys() {
        features.insert(name.clone(), false);
    }
    for (name, enabled) in features.iter_mut() {
        *enabled = feature_enabled(Some(&license), name, now_secs);
    }

    let trial = trial_time_remaining(Some(&license), now_secs);
    LicenseDto {
        hardware_id: Some(license.hardware_id.clone()),
        confirmed_token: license.confirmed_token,
        active_tier: license.active_tier().map(str::to_string),
        features,
        trial_seconds_remaining: trial,
        trial_remaining_text: trial.and_then(time_remaining_text),
    }
}

// ── Preferences ───────────────────────────────────────────────────────────────

pub async fn retrieve_dont_show_again_keys(state: Arc<AppState>) -> CommandResult<Vec<String>> {
    let settings = state.settings.lock().await;
    CommandResult::ok(preferences::dismissed_hints(&settings))
}

pub async fn set_dont_show_again(state: Arc<AppState>, key: String) -> CommandResult<Vec<String>> {
    let mut settings = state.settings.lock().await;
    match preferences::dismiss_hint(&mut settings, &key) {
        Ok(keys) => CommandResult::ok(keys),
        Err(e) => CommandResult::err(format!("failed to save settings: {e}")),
    }
}

pub async fn reset_dont_show_again(state: Arc<AppState>) -> CommandResult<()> {
    let mut settings = state.settings.lock().await;
    match preferences::reset_hints(&mut settings) {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(format!("failed to save settings: {e}")),
    }
}

// ── Driver lifecycle ──────────────────────────────────────────────────────────

/// Startup sequence: request supporter features, then make sure the driver
/// for this version is installed.
pub async fn startup(state: Arc<AppState>) -> CommandResult<bool> {
    manage_driver::request_supporter_features(&state.control_channel);
    install_driver(state).await
}

pub async fn is_driver_running(state: Arc<AppState>) -> CommandResult<bool> {
    CommandResult::ok(state.driver.is_driver_running().await)
}

/// Returns `true` once the driver is installed for this version and running.
///
/// While an install is in progress the call waits for it, polling up to
/// `retry.attempts` times `retry.spacing` apart.
pub async fn is_driver_ready(state: Arc<AppState>) -> CommandResult<bool> {
    let mut waited = 0;
    loop {
        let status = *state.install_status.lock().await;
        if !status.installing || waited >= state.retry.attempts {
            if !status.installed {
                return CommandResult::ok(false);
            }
            return CommandResult::ok(state.driver.is_driver_running().await);
        }
        tokio::time::sleep(state.retry.spacing).await;
        waited += 1;
    }
}

/// Installs the driver unless it is already installed for this version.
pub async fn install_driver(state: Arc<AppState>) -> CommandResult<bool> {
    {
        let mut status = state.install_status.lock().await;
        if status.installing {
            return CommandResult::err("driver installation already in progress");
        }
        status.installing = true;
    }

    let installed = {
        let mut settings = state.settings.lock().await;
        manage_driver::ensure_installed(
            state.driver.as_ref(),
            &mut settings,
            &state.plugin_version,
            state.retry,
        )
        .await
    };

    *state.install_status.lock().await = InstallStatus {
        installing: false,
        installed,
    };
    if installed {
        info!("driver ready for plugin version {}", state.plugin_version);
    } else {
        warn!("driver is not installed");
    }
    CommandResult::ok(installed)
}

pub async fn uninstall_driver(state: Arc<AppState>) -> CommandResult<bool> {
    let removed = state.driver.uninstall().await;
    if removed {
        state.install_status.lock().await.installed = false;
    }
    CommandResult::ok(removed)
}

pub async fn request_token(state: Arc<AppState>, email: String) -> CommandResult<bool> {
    if email.trim().is_empty() {
        return CommandResult::err("email must not be empty");
    }
    CommandResult::ok(state.driver.request_token(email.trim()).await)
}

/// Verifies an emailed token and asks the driver to refresh its license.
pub async fn verify_token(state: Arc<AppState>, token: String) -> CommandResult<bool> {
    if token.trim().is_empty() {
        return CommandResult::err("token must not be empty");
    }
    let verified = state.driver.verify_token(token.trim()).await;
    if verified {
        let refresh = ControlFlags {
            refresh_device_license: Some(true),
            ..ControlFlags::default()
        };
        if let Err(e) = state.control_channel.send(&refresh) {
            warn!("token verified but the license refresh was not sent: {e}");
        }
    }
    CommandResult::ok(verified)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
