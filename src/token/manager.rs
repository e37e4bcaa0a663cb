//! Token Manager
//!
//! Keeps a token file usable: creates it when missing, validates it against
//! the AAA service, and renews it when the service rejects it.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ArgumentError, HxTokenError};
use crate::token::client::TokenClient;
use crate::token::lock::PathLocks;
use crate::token::storage::TokenStore;
use crate::types::{
    default_origin, Credentials, OverwritePolicy, ProjectedValue, Projection, Scope, TokenRecord,
    TokenSet,
};

/// Token manager interface.
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Return `projection` of a valid token record at `path`.
    ///
    /// `Ok(None)` means the stored token was rejected and `overwrite`
    /// forbade replacing it.
    ///
    /// Creation times have whole-second precision, so a token renewed within
    /// the same second it was issued carries the same `created_at`.
    async fn ensure_token(
        &self,
        path: &Path,
        projection: Projection,
        overwrite: OverwritePolicy,
    ) -> Result<Option<ProjectedValue>, HxTokenError>;

    /// Obtain a token and write a fresh record to `path`.
    ///
    /// With `OverwritePolicy::Preserve` an existing file is left alone and
    /// `Ok(None)` is returned without contacting the service.
    async fn create_token_file(
        &self,
        path: &Path,
        overwrite: OverwritePolicy,
    ) -> Result<Option<TokenRecord>, HxTokenError>;

    /// Read `projection` of the record at `path` without validating it.
    async fn load_token_file(
        &self,
        path: &Path,
        projection: Projection,
    ) -> Result<ProjectedValue, HxTokenError>;

    /// Revoke the token stored at `path`, deleting the file afterwards if
    /// `remove` is set and the service accepted the revocation.
    async fn revoke_token_file(&self, path: &Path, remove: bool) -> Result<bool, HxTokenError>;
}

/// How a rejected token is replaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenewalStrategy {
    /// Always exchange username and password for a new token.
    #[default]
    Reobtain,
    /// Try the stored refresh token first, then fall back to a full obtain.
    RefreshThenReobtain,
}

/// Token manager configuration.
#[derive(Clone, Debug, Default)]
pub struct TokenManagerConfig {
    /// Scope checked when validating a stored token (default: READ).
    pub scope: Scope,
    /// Renewal strategy for rejected tokens.
    pub renewal: RenewalStrategy,
}

/// Default token manager implementation.
pub struct DefaultTokenManager<C: TokenClient, S: TokenStore> {
    client: Arc<C>,
    store: Arc<S>,
    credentials: Credentials,
    config: TokenManagerConfig,
    origin: String,
    locks: Arc<PathLocks>,
}

impl<C: TokenClient, S: TokenStore> DefaultTokenManager<C, S> {
    /// Create new token manager.
    pub fn new(
        client: Arc<C>,
        store: Arc<S>,
        credentials: Credentials,
        config: TokenManagerConfig,
    ) -> Self {
        Self {
            client,
            store,
            credentials,
            config,
            origin: default_origin(),
            locks: PathLocks::global(),
        }
    }

    /// Set the provenance tag written into new records.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Use a private lock registry instead of the process-wide one.
    pub fn with_locks(mut self, locks: Arc<PathLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn config(&self) -> &TokenManagerConfig {
        &self.config
    }

    fn check_path(path: &Path) -> Result<(), HxTokenError> {
        if path.as_os_str().is_empty() {
            return Err(ArgumentError::EmptyPath.into());
        }
        Ok(())
    }

    /// Obtain a new token, persist it and read it back.
    async fn issue(&self, path: &Path) -> Result<TokenRecord, HxTokenError> {
        let token = self.client.obtain(&self.credentials).await?;
        self.persist(path, token).await
    }

    async fn persist(&self, path: &Path, token: TokenSet) -> Result<TokenRecord, HxTokenError> {
        let record = TokenRecord::issued_now(token, &self.origin);
        self.store.write(path, &record).await?;
        self.store.read_record(path).await
    }

    async fn renew(&self, stale: &TokenSet) -> Result<TokenSet, HxTokenError> {
        if self.config.renewal == RenewalStrategy::RefreshThenReobtain {
            match self.client.refresh(stale).await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    warn!(error = %e, "Refresh failed, falling back to a full obtain");
                }
            }
        }
        self.client.obtain(&self.credentials).await
    }

    // Metadata of an existing record is served without locking or validating.
    async fn read_metadata(
        &self,
        path: &Path,
        projection: Projection,
    ) -> Result<Option<ProjectedValue>, HxTokenError> {
        match self.store.read(path, projection).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<C: TokenClient, S: TokenStore> TokenManager for DefaultTokenManager<C, S> {
    async fn ensure_token(
        &self,
        path: &Path,
        projection: Projection,
        overwrite: OverwritePolicy,
    ) -> Result<Option<ProjectedValue>, HxTokenError> {
        Self::check_path(path)?;

        if !projection.requires_validation() {
            if let Some(value) = self.read_metadata(path, projection).await? {
                debug!(path = %path.display(), projection = %projection, "Returning token metadata");
                return Ok(Some(value));
            }
        }

        let _guard = self.locks.acquire(path).await;

        let record = match self.store.read_record(path).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                info!(path = %path.display(), "Token file not found, obtaining a new token");
                let record = self.issue(path).await?;
                info!(path = %path.display(), "Token file created");
                return Ok(Some(record.project(projection)));
            }
            Err(e) => return Err(e),
        };

        // Another caller may have created the file while we waited.
        if !projection.requires_validation() {
            return Ok(Some(record.project(projection)));
        }

        if self.client.validate(&record.token, self.config.scope).await? {
            debug!(path = %path.display(), "Stored token is valid");
            return Ok(Some(record.project(projection)));
        }

        if !overwrite.allows_renewal() {
            info!(path = %path.display(), "Stored token is invalid and overwrite is disabled");
            return Ok(None);
        }

        info!(path = %path.display(), "Stored token is invalid, renewing");
        let token = self.renew(&record.token).await?;
        let renewed = self.persist(path, token).await?;
        info!(path = %path.display(), "Token file renewed");

        Ok(Some(renewed.project(projection)))
    }

    async fn create_token_file(
        &self,
        path: &Path,
        overwrite: OverwritePolicy,
    ) -> Result<Option<TokenRecord>, HxTokenError> {
        Self::check_path(path)?;
        let _guard = self.locks.acquire(path).await;

        if !overwrite.allows_renewal() && self.store.exists(path).await? {
            info!(path = %path.display(), "Token file exists and overwrite is disabled");
            return Ok(None);
        }

        let record = self.issue(path).await?;
        info!(path = %path.display(), "Token file created");
        Ok(Some(record))
    }

    async fn load_token_file(
        &self,
        path: &Path,
        projection: Projection,
    ) -> Result<ProjectedValue, HxTokenError> {
        Self::check_path(path)?;
        self.store.read(path, projection).await
    }

    async fn revoke_token_file(&self, path: &Path, remove: bool) -> Result<bool, HxTokenError> {
        Self::check_path(path)?;
        let _guard = self.locks.acquire(path).await;

        let record = self.store.read_record(path).await?;
        let revoked = self.client.revoke(&record.token).await?;

        if revoked && remove {
            self.store.delete(path).await?;
            info!(path = %path.display(), "Revoked token file removed");
        }
        Ok(revoked)
    }
}
