//! Token Management
//!
//! Token lifecycle management for HyperFlex AAA tokens.
//!
//! This module provides:
//!
//! - **Token Client**: obtain, refresh, validate and revoke over HTTPS
//! - **Token Storage**: token files on disk and an in-memory store
//! - **Path Locks**: per-file serialization of lifecycle operations
//! - **Token Manager**: the create/validate/renew state machine

pub mod client;
pub mod lock;
pub mod manager;
pub mod storage;

// Token Client
pub use client::{create_mock_token_client, DefaultTokenClient, MockTokenClient, TokenClient};

// Token Storage
pub use storage::{create_in_memory_token_store, FileTokenStore, InMemoryTokenStore, TokenStore};

// Path Locks
pub use lock::{PathGuard, PathLocks};

// Token Manager
pub use manager::{DefaultTokenManager, RenewalStrategy, TokenManager, TokenManagerConfig};
