//! HyperFlex API Token Integration
//!
//! Obtains, stores, validates and renews HyperFlex Connect API tokens.
//!
//! # Features
//!
//! - Password grant, refresh, validate and revoke against `/aaa/v1/`
//! - Token files in the established `hx_api_token` XML layout
//! - `ensure_token`: always hand back a token the cluster accepts
//! - Atomic file replacement and per-path locking
//!
//! # Example
//!
//! ```rust,ignore
//! use hyperflex_token_integration::{hx_token_client, hx_token_config, Credentials, OverwritePolicy, Projection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = hx_token_config()
//!         .target("hx-cluster.example.com")
//!         .build()?;
//!
//!     let client = hx_token_client(config, Credentials::new("admin", "password"))?;
//!
//!     let access_token = client
//!         .ensure_token("hx_api_token.xml", Projection::AccessToken, OverwritePolicy::Overwrite)
//!         .await?;
//!
//!     if let Some(value) = access_token {
//!         println!("Authorization: Bearer {}", value.as_str().unwrap_or_default());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: tokens, records, projections and configuration
//! - `error`: error hierarchy and HTTP response mapping
//! - `core`: HTTP transport
//! - `codec`: XML token documents
//! - `token`: AAA client, storage, path locks and lifecycle manager
//! - `builders`: fluent configuration builder
//! - `client`: high-level client combining all of the above

pub mod builders;
pub mod client;
pub mod codec;
pub mod core;
pub mod error;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{hx_token_client, HxTokenClient};

// Re-export builders
pub use builders::{hx_token_config, HxTokenConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, parse_error_message, ArgumentError, ConfigurationError,
    HxTokenError, HxTokenResult, NetworkError, ProtocolError, ProviderError, StorageError,
};

// Re-export types
pub use types::{
    // Config
    default_origin, ClientIdentity, Credentials, HxTokenConfig,
    // Token
    CreationTime, Scope, TokenRecord, TokenSet, BEARER_TOKEN_TYPE, UNKNOWN_ORIGIN,
    // Projection
    OverwritePolicy, ProjectedValue, Projection,
};

// Re-export core components
pub use core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, ReqwestHttpTransport};

// Re-export token management
pub use token::{
    // Client
    DefaultTokenClient, MockTokenClient, TokenClient,
    // Storage
    FileTokenStore, InMemoryTokenStore, TokenStore,
    // Locks
    PathLocks,
    // Manager
    DefaultTokenManager, RenewalStrategy, TokenManager, TokenManagerConfig,
};
