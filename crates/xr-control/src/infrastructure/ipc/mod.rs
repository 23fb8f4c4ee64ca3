//! Shared-memory channels to and from the running driver.
//!
//! - **`control_channel`** – [`control_channel::ControlFlagChannel`], one-way
//!   commands to the driver.
//! - **`state_channel`** – [`state_channel::DriverStateReader`], the status
//!   the driver publishes with a heartbeat.

pub mod control_channel;
pub mod state_channel;
