//! HyperFlex Token Client
//!
//! High-level client that combines the AAA operations with token file management.

use std::path::Path;
use std::sync::Arc;

use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::HxTokenError;
use crate::token::{
    DefaultTokenClient, DefaultTokenManager, FileTokenStore, TokenClient, TokenManager,
    TokenManagerConfig, TokenStore,
};
use crate::types::{
    Credentials, HxTokenConfig, OverwritePolicy, ProjectedValue, Projection, Scope, TokenRecord,
    TokenSet,
};

/// Client for obtaining and maintaining HyperFlex API tokens.
pub struct HxTokenClient<T: HttpTransport = ReqwestHttpTransport, S: TokenStore = FileTokenStore> {
    config: HxTokenConfig,
    credentials: Credentials,
    token_client: Arc<DefaultTokenClient<T>>,
    manager: DefaultTokenManager<DefaultTokenClient<T>, S>,
}

impl HxTokenClient<ReqwestHttpTransport, FileTokenStore> {
    /// Create a new client with the reqwest transport and file storage.
    pub fn new(config: HxTokenConfig, credentials: Credentials) -> Result<Self, HxTokenError> {
        let transport = ReqwestHttpTransport::new(&config)?;
        Ok(Self::with_components(
            config,
            credentials,
            transport,
            FileTokenStore::new(),
            TokenManagerConfig::default(),
        ))
    }
}

impl<T: HttpTransport, S: TokenStore> HxTokenClient<T, S> {
    /// Create a client with custom implementations.
    pub fn with_components(
        config: HxTokenConfig,
        credentials: Credentials,
        transport: T,
        store: S,
        manager_config: TokenManagerConfig,
    ) -> Self {
        let token_client = Arc::new(DefaultTokenClient::new(config.clone(), Arc::new(transport)));
        let manager = DefaultTokenManager::new(
            token_client.clone(),
            Arc::new(store),
            credentials.clone(),
            manager_config,
        )
        .with_origin(config.origin.clone());

        Self {
            config,
            credentials,
            token_client,
            manager,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HxTokenConfig {
        &self.config
    }

    // ========== AAA Operations ==========

    /// Exchange the configured credentials for a new token set.
    pub async fn obtain_token(&self) -> Result<TokenSet, HxTokenError> {
        self.token_client.obtain(&self.credentials).await
    }

    /// Mint a new token set from `token`.
    pub async fn refresh_token(&self, token: &TokenSet) -> Result<TokenSet, HxTokenError> {
        self.token_client.refresh(token).await
    }

    /// Check `token` against `scope`.
    pub async fn validate_token(&self, token: &TokenSet, scope: Scope) -> Result<bool, HxTokenError> {
        self.token_client.validate(token, scope).await
    }

    /// Revoke `token`.
    pub async fn revoke_token(&self, token: &TokenSet) -> Result<bool, HxTokenError> {
        self.token_client.revoke(token).await
    }

    // ========== Token Files ==========

    /// Return a projection of a valid token stored at `path`, creating or
    /// renewing the file as needed.
    pub async fn ensure_token(
        &self,
        path: impl AsRef<Path>,
        projection: Projection,
        overwrite: OverwritePolicy,
    ) -> Result<Option<ProjectedValue>, HxTokenError> {
        self.manager
            .ensure_token(path.as_ref(), projection, overwrite)
            .await
    }

    /// `ensure_token` with string arguments, e.g. `("access_token", "False")`.
    ///
    /// Both arguments are parsed before any file or network access.
    pub async fn manage_token_file(
        &self,
        path: impl AsRef<Path>,
        data: &str,
        overwrite: &str,
    ) -> Result<Option<ProjectedValue>, HxTokenError> {
        let projection: Projection = data.parse()?;
        let overwrite: OverwritePolicy = overwrite.parse()?;
        self.ensure_token(path, projection, overwrite).await
    }

    /// Obtain a token and write it to `path`.
    pub async fn create_token_file(
        &self,
        path: impl AsRef<Path>,
        overwrite: OverwritePolicy,
    ) -> Result<Option<TokenRecord>, HxTokenError> {
        self.manager.create_token_file(path.as_ref(), overwrite).await
    }

    /// Read a token file without validating it.
    pub async fn load_token_file(
        &self,
        path: impl AsRef<Path>,
        projection: Projection,
    ) -> Result<ProjectedValue, HxTokenError> {
        self.manager.load_token_file(path.as_ref(), projection).await
    }

    /// Revoke the token stored at `path`, optionally removing the file.
    pub async fn revoke_token_file(
        &self,
        path: impl AsRef<Path>,
        remove: bool,
    ) -> Result<bool, HxTokenError> {
        self.manager.revoke_token_file(path.as_ref(), remove).await
    }
}

/// Create a HyperFlex token client with default components.
pub fn hx_token_client(
    config: HxTokenConfig,
    credentials: Credentials,
) -> Result<HxTokenClient, HxTokenError> {
    HxTokenClient::new(config, credentials)
}
