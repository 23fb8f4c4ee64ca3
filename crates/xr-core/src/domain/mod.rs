//! Domain types for the XR driver control plane.
//!
//! Pure logic with no file system access: every function here takes text or
//! values in and hands text or values back.  The infrastructure layer of
//! `xr-control` owns the files.
//!
//! - **`config`** – the schema table and the typed [`config::Config`].
//! - **`view`** – headset-mode view derivation and its inverse mapping.
//! - **`control`** – control-flag vocabulary and boundary validation.
//! - **`driver_state`** – driver status snapshot and heartbeat staleness.
//! - **`license`** – typed view of the device license record.

pub mod config;
pub mod control;
pub mod driver_state;
pub mod license;
pub mod view;
