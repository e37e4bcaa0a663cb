//! HyperFlex Token Types
//!
//! Core type definitions for token lifecycle operations.

pub mod config;
pub mod projection;
pub mod token;

pub use config::*;
pub use projection::*;
pub use token::*;
