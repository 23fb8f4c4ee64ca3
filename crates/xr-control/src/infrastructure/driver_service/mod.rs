//! The driver's own tooling: service manager, installer and license CLI.
//!
//! These collaborators run out of process.  Every operation reports a plain
//! `bool`: failures are logged here and the caller only decides what to show.
//! [`process::ProcessDriverService`] is the real implementation; tests inject
//! doubles through the [`DriverService`] trait.

use async_trait::async_trait;
use thiserror::Error;

pub mod process;

pub use process::ProcessDriverService;

/// Error raised when a collaborator process cannot be run at all.
#[derive(Debug, Error)]
pub enum DriverServiceError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Operations on the installed driver.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriverService: Send + Sync {
    /// Returns `true` when the driver's user service is active.
    async fn is_driver_running(&self) -> bool;

    /// Runs the driver installer once.  Returns `true` when it exited cleanly.
    async fn run_installer(&self) -> bool;

    /// Removes the driver.
    async fn uninstall(&self) -> bool;

    /// Asks the license server to email a verification token.
    async fn request_token(&self, email: &str) -> bool;

    /// Confirms a token received by email.
    async fn verify_token(&self, token: &str) -> bool;
}
