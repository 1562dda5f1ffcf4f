//! Core business logic
//!
//! Plan construction and execution. File and process access goes through
//! [`crate::infra`]; version lookups go through [`resolver::VersionResolver`].

pub mod channel;
pub mod doctor;
pub mod global_config;
pub mod kind;
pub mod options;
pub mod package;
pub mod plan;
pub mod resolver;
pub mod template;
pub mod walker;
