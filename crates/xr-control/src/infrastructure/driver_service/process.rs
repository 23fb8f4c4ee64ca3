//! [`DriverService`] backed by child processes.
//!
//! | Operation        | Command                                        |
//! |------------------|------------------------------------------------|
//! | running?         | `systemctl --user is-active xr-driver`         |
//! | install          | `<setup_script>`                               |
//! | uninstall        | `<bin_dir>/xr_driver_uninstall`                |
//! | request token    | `<bin_dir>/xr_driver_cli --request-token EMAIL`|
//! | verify token     | `<bin_dir>/xr_driver_cli --verify-token TOKEN` |

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::{DriverService, DriverServiceError};
use crate::infrastructure::storage::paths::ServiceConfig;

/// systemd user unit that runs the driver.
pub const DRIVER_UNIT: &str = "xr-driver";
pub const DRIVER_CLI: &str = "xr_driver_cli";
pub const DRIVER_UNINSTALL: &str = "xr_driver_uninstall";

pub struct ProcessDriverService {
    bin_dir: PathBuf,
    setup_script: PathBuf,
}

impl ProcessDriverService {
    pub fn new(bin_dir: impl Into<PathBuf>, setup_script: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            setup_script: setup_script.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.bin_dir.clone(), config.setup_script.clone())
    }

    async fn run<I, S>(&self, program: impl AsRef<OsStr>, args: I) -> Result<Output, DriverServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DriverServiceError::Launch {
                program: program.to_string_lossy().into_owned(),
                source,
            })
    }

    /// Runs a collaborator and maps a clean exit to `true`.
    async fn run_checked<I, S>(&self, what: &str, program: impl AsRef<OsStr>, args: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        match self.run(program, args).await {
            Ok(output) if output.status.success() => {
                debug!("{what} succeeded");
                true
            }
            Ok(output) => {
                error!(
                    "{what} failed ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                error!("{what}: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl DriverService for ProcessDriverService {
    async fn is_driver_running(&self) -> bool {
        let output = match self.run("systemctl", ["--user", "is-active", DRIVER_UNIT]).await {
            Ok(output) => output,
            Err(e) => {
                error!("could not query driver service: {e}");
                return false;
            }
        };
        service_is_active(&String::from_utf8_lossy(&output.stdout))
    }

    async fn run_installer(&self) -> bool {
        info!("running driver installer {}", self.setup_script.display());
        self.run_checked("driver install", &self.setup_script, std::iter::empty::<&str>())
            .await
    }

    async fn uninstall(&self) -> bool {
        info!("uninstalling driver");
        self.run_checked(
            "driver uninstall",
            self.bin_dir.join(DRIVER_UNINSTALL),
            std::iter::empty::<&str>(),
        )
        .await
    }

    async fn request_token(&self, email: &str) -> bool {
        self.run_checked(
            "token request",
            self.bin_dir.join(DRIVER_CLI),
            ["--request-token", email],
        )
        .await
    }

    async fn verify_token(&self, token: &str) -> bool {
        let verified = self
            .run_checked(
                "token verification",
                self.bin_dir.join(DRIVER_CLI),
                ["--verify-token", token],
            )
            .await;
        if !verified {
            warn!("token was not accepted");
        }
        verified
    }
}

/// Interprets `systemctl is-active` output.
///
/// `active` is running; `inactive` is a normal stopped state; anything else
/// (`failed`, `activating`, empty output) is logged.
fn service_is_active(stdout: &str) -> bool {
    match stdout.trim() {
        "active" => true,
        "inactive" => false,
        other => {
            error!("unexpected driver service status: {other:?}");
            false
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
