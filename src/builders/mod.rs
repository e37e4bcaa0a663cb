//! Builders
//!
//! Fluent builders for HyperFlex token configuration.

pub mod config;

pub use config::*;
