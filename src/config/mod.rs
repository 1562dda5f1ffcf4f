//! Configuration constants
//!
//! Built-in defaults and well-known URLs. User overrides live in
//! [`crate::core::global_config`].

pub mod defaults;
pub mod urls;
