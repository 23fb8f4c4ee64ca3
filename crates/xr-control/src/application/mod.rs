//! Application layer use cases for the control plane.
//!
//! Use cases here orchestrate the stores and the [`DriverService`] to fulfil
//! one user goal each.  They hold no state of their own: the stores are
//! passed in, so the UI bridge and the CLI share the same code paths.
//!
//! # Sub-modules
//!
//! - **`manage_driver`** – "is the driver installed for this version?" and
//!   the bounded install retry loop.
//!
//! - **`preferences`** – dismissing and restoring UI hints.
//!
//! [`DriverService`]: crate::infrastructure::driver_service::DriverService

pub mod manage_driver;
pub mod preferences;
