//! Infrastructure layer: everything that touches files or processes.
//!
//! - **`storage`** – the driver config file, this tool's settings and the
//!   atomic write helper.
//! - **`ipc`** – the control-flag and driver-state channels.
//! - **`driver_service`** – the driver's service manager, installer and
//!   license CLI.
//! - **`ui_bridge`** – the operations a front end calls, wrapped in a uniform
//!   result envelope.

pub mod driver_service;
pub mod ipc;
pub mod storage;
pub mod ui_bridge;
