//! Driver installation use case.
//!
//! A driver counts as installed for this tool only when its service is
//! running **and** it was installed by the current plugin version; an older
//! install is replaced so the driver and the control plane agree on the
//! config schema.

use tracing::{error, info, warn};

use crate::infrastructure::driver_service::DriverService;
use crate::infrastructure::ipc::control_channel::ControlFlagChannel;
use crate::infrastructure::storage::paths::RetryPolicy;
use crate::infrastructure::storage::settings::SettingsStore;
use xr_core::ControlFlags;

/// Returns `true` when the driver runs and was installed by `version`.
pub async fn is_installed(service: &dyn DriverService, settings: &SettingsStore, version: &str) -> bool {
    if settings.installed_from_plugin_version() != Some(version) {
        return false;
    }
    service.is_driver_running().await
}

/// Runs the installer up to `policy.attempts` times.
///
/// After each run the service is checked; once it is running the version is
/// recorded and `true` is returned.  Between attempts the loop sleeps
/// `policy.spacing`.
pub async fn install(
    service: &dyn DriverService,
    settings: &mut SettingsStore,
    version: &str,
    policy: RetryPolicy,
) -> bool {
    for attempt in 1..=policy.attempts {
        info!("installing driver (attempt {attempt}/{})", policy.attempts);
        if service.run_installer().await && service.is_driver_running().await {
            if let Err(e) = settings.record_installed_version(version) {
                error!("driver installed but the version could not be recorded: {e}");
            }
            return true;
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.spacing).await;
        }
    }
    warn!("driver installation failed after {} attempts", policy.attempts);
    false
}

/// Installs the driver unless it is already installed for `version`.
pub async fn ensure_installed(
    service: &dyn DriverService,
    settings: &mut SettingsStore,
    version: &str,
    policy: RetryPolicy,
) -> bool {
    if is_installed(service, settings, version).await {
        return true;
    }
    install(service, settings, version, policy).await
}

/// Startup handshake: asks the driver to enable supporter-tier features.
pub fn request_supporter_features(channel: &ControlFlagChannel) {
    if let Err(e) = channel.send(&ControlFlags::request_supporter_features()) {
        warn!("could not request supporter features: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
