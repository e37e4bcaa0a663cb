//! Token Client
//!
//! The four AAA operations: obtain, refresh, validate and revoke.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::core::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::{create_error_from_response, HxTokenError, ProtocolError};
use crate::types::{Credentials, HxTokenConfig, Scope, TokenSet};

const OBTAIN_PATH: &str = "auth?grant_type=password";
const REFRESH_PATH: &str = "token?grant_type=refresh";
const VALIDATE_PATH: &str = "validate";
const REVOKE_PATH: &str = "revoke";

/// Token client interface.
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// Exchange username and password for a new token set.
    async fn obtain(&self, credentials: &Credentials) -> Result<TokenSet, HxTokenError>;

    /// Mint a new token set from an existing one without a password.
    async fn refresh(&self, token: &TokenSet) -> Result<TokenSet, HxTokenError>;

    /// Ask the service whether the access token is valid for `scope`.
    ///
    /// Rejections and transport failures both yield `Ok(false)`; only
    /// malformed input is an error.
    async fn validate(&self, token: &TokenSet, scope: Scope) -> Result<bool, HxTokenError>;

    /// Revoke the token set. Same result contract as `validate`.
    async fn revoke(&self, token: &TokenSet) -> Result<bool, HxTokenError>;
}

#[derive(Serialize)]
struct PasswordGrantBody<'a> {
    username: &'a str,
    password: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

#[derive(Serialize)]
struct ValidateBody<'a> {
    access_token: &'a str,
    scope: Scope,
    token_type: &'a str,
}

/// Default token client implementation.
pub struct DefaultTokenClient<T: HttpTransport> {
    config: HxTokenConfig,
    transport: Arc<T>,
}

impl<T: HttpTransport> DefaultTokenClient<T> {
    /// Create new token client.
    pub fn new(config: HxTokenConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &HxTokenConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpResponse, HxTokenError> {
        let url = self.config.endpoint(path)?;
        let body = serde_json::to_string(body).map_err(|e| ProtocolError::InvalidJson {
            message: e.to_string(),
        })?;

        debug!(url = %url, "Sending AAA request");
        let request = HttpRequest::post_json(url.as_str(), body, self.config.timeout);
        self.transport.send(request).await
    }

    // Obtain and refresh both answer 201 with a fresh token set.
    fn parse_issued_token(response: HttpResponse) -> Result<TokenSet, HxTokenError> {
        if response.status != 201 {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let token: TokenSet =
            serde_json::from_str(&response.body).map_err(|e| ProtocolError::InvalidJson {
                message: e.to_string(),
            })?;

        token.ensure_complete().map_err(|e| ProtocolError::InvalidResponse {
            message: e.to_string(),
        })?;

        Ok(token)
    }

    // Collapse every failure of a yes/no operation into `false`, logging why.
    fn into_verdict(operation: &str, result: Result<HttpResponse, HxTokenError>) -> bool {
        match result {
            Ok(response) if response.status == 200 => true,
            Ok(response) => {
                let error = create_error_from_response(response.status, &response.body);
                warn!(operation, status = response.status, error = %error, "AAA request rejected");
                false
            }
            Err(error) => {
                warn!(operation, code = error.error_code(), error = %error, "AAA request failed");
                false
            }
        }
    }
}

#[async_trait]
impl<T: HttpTransport> TokenClient for DefaultTokenClient<T> {
    async fn obtain(&self, credentials: &Credentials) -> Result<TokenSet, HxTokenError> {
        let identity = &self.config.client_identity;
        let body = PasswordGrantBody {
            username: &credentials.username,
            password: credentials.password(),
            client_id: &identity.client_id,
            client_secret: &identity.client_secret,
            redirect_uri: &identity.redirect_uri,
        };

        info!(username = %credentials.username, "Obtaining HyperFlex API access token");
        let result = self
            .post(OBTAIN_PATH, &body)
            .await
            .and_then(Self::parse_issued_token);

        match &result {
            Ok(_) => info!("HyperFlex API access token obtained"),
            Err(error) => warn!(error = %error, "Failed to obtain HyperFlex API access token"),
        }
        result
    }

    async fn refresh(&self, token: &TokenSet) -> Result<TokenSet, HxTokenError> {
        token.ensure_complete()?;

        info!("Refreshing HyperFlex API access token");
        let result = self
            .post(REFRESH_PATH, token)
            .await
            .and_then(Self::parse_issued_token);

        match &result {
            Ok(_) => info!("HyperFlex API access token refreshed"),
            Err(error) => warn!(error = %error, "Failed to refresh HyperFlex API access token"),
        }
        result
    }

    async fn validate(&self, token: &TokenSet, scope: Scope) -> Result<bool, HxTokenError> {
        token.ensure_complete()?;

        let body = ValidateBody {
            access_token: &token.access_token,
            scope,
            token_type: &token.token_type,
        };

        debug!(scope = %scope, "Validating HyperFlex API access token");
        let valid = Self::into_verdict("validate", self.post(VALIDATE_PATH, &body).await);
        if valid {
            info!(scope = %scope, "HyperFlex API access token is valid");
        }
        Ok(valid)
    }

    async fn revoke(&self, token: &TokenSet) -> Result<bool, HxTokenError> {
        token.ensure_complete()?;

        info!("Revoking HyperFlex API access token");
        let revoked = Self::into_verdict("revoke", self.post(REVOKE_PATH, token).await);
        if revoked {
            info!("HyperFlex API access token revoked");
        }
        Ok(revoked)
    }
}

/// Mock token client for testing.
///
/// Every issued token is unique (`mock-access-1`, `mock-access-2`, ...).
#[derive(Default)]
pub struct MockTokenClient {
    obtain_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    validate_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
    issued: AtomicUsize,
    valid_tokens: Mutex<Vec<String>>,
    revoked_tokens: Mutex<Vec<String>>,
    fail_obtain: Mutex<bool>,
    fail_refresh: Mutex<bool>,
    revoke_result: Mutex<Option<bool>>,
}

impl MockTokenClient {
    /// Create new mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every obtain call fail with a 401.
    pub fn set_fail_obtain(&self, fail: bool) -> &Self {
        *self.fail_obtain.lock().unwrap() = fail;
        self
    }

    /// Make every refresh call fail with a 401.
    pub fn set_fail_refresh(&self, fail: bool) -> &Self {
        *self.fail_refresh.lock().unwrap() = fail;
        self
    }

    /// Force the outcome of revoke calls.
    pub fn set_revoke_result(&self, result: bool) -> &Self {
        *self.revoke_result.lock().unwrap() = Some(result);
        self
    }

    /// Mark an access token as valid.
    pub fn mark_valid(&self, access_token: &str) -> &Self {
        self.valid_tokens
            .lock()
            .unwrap()
            .push(access_token.to_string());
        self
    }

    /// Mark an access token as no longer valid.
    pub fn invalidate(&self, access_token: &str) -> &Self {
        self.valid_tokens
            .lock()
            .unwrap()
            .retain(|t| t != access_token);
        self
    }

    pub fn obtain_calls(&self) -> usize {
        self.obtain_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    /// Total calls across all four operations.
    pub fn total_calls(&self) -> usize {
        self.obtain_calls() + self.refresh_calls() + self.validate_calls() + self.revoke_calls()
    }

    /// Check if a specific access token was revoked.
    pub fn was_revoked(&self, access_token: &str) -> bool {
        self.revoked_tokens
            .lock()
            .unwrap()
            .iter()
            .any(|t| t == access_token)
    }

    fn issue(&self) -> TokenSet {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = TokenSet::new(
            format!("mock-access-{}", n),
            format!("mock-refresh-{}", n),
            "Bearer",
        );
        self.mark_valid(&token.access_token);
        token
    }

    fn rejection() -> HxTokenError {
        create_error_from_response(401, r#"{"message":"Authentication failed"}"#)
    }
}

#[async_trait]
impl TokenClient for MockTokenClient {
    async fn obtain(&self, _credentials: &Credentials) -> Result<TokenSet, HxTokenError> {
        self.obtain_calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to interleave.
        tokio::task::yield_now().await;

        if *self.fail_obtain.lock().unwrap() {
            return Err(Self::rejection());
        }
        Ok(self.issue())
    }

    async fn refresh(&self, token: &TokenSet) -> Result<TokenSet, HxTokenError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        token.ensure_complete()?;

        if *self.fail_refresh.lock().unwrap() {
            return Err(Self::rejection());
        }
        Ok(self.issue())
    }

    async fn validate(&self, token: &TokenSet, _scope: Scope) -> Result<bool, HxTokenError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        token.ensure_complete()?;

        Ok(self
            .valid_tokens
            .lock()
            .unwrap()
            .iter()
            .any(|t| t == &token.access_token))
    }

    async fn revoke(&self, token: &TokenSet) -> Result<bool, HxTokenError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        token.ensure_complete()?;

        let revoked = self.revoke_result.lock().unwrap().unwrap_or(true);
        if revoked {
            self.invalidate(&token.access_token);
            self.revoked_tokens
                .lock()
                .unwrap()
                .push(token.access_token.clone());
        }
        Ok(revoked)
    }
}

/// Create mock token client for testing.
pub fn create_mock_token_client() -> MockTokenClient {
    MockTokenClient::new()
}
