//! Core Components
//!
//! Core infrastructure for HyperFlex AAA operations.

pub mod transport;

pub use transport::*;
