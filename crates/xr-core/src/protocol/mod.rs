//! Text protocol shared by the config file and the two driver channels.
//!
//! - **`codec`** – line splitting, scalar parsers and value rendering.

pub mod codec;
