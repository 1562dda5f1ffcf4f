//! Infrastructure layer
//!
//! Network, filesystem and process access.

pub mod dirs;
pub mod filesystem;
pub mod release;
pub mod toolchain;
