//! Configuration Types
//!
//! HyperFlex token client configuration types.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::error::{ConfigurationError, HxTokenError};

/// Client identifier expected by the AAA service.
pub const HX_CLIENT_ID: &str = "HxGuiClient";
/// Client secret expected by the AAA service (a protocol constant, not a secret).
pub const HX_CLIENT_SECRET: &str = "Sunnyvale";
/// Redirect URI expected by the AAA service.
pub const HX_REDIRECT_URI: &str = "http://localhost:8080/aaa/redirect";
/// Path of the AAA API below the target host.
pub const AAA_API_PATH: &str = "aaa/v1/";

/// Default configuration values.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Default origin written into new records.
pub fn default_origin() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// HyperFlex token client configuration.
#[derive(Clone, Debug)]
pub struct HxTokenConfig {
    /// Base URL of the AAA API, ending in `/aaa/v1/`.
    pub base_url: Url,
    /// HTTP timeout per request.
    pub timeout: Duration,
    /// Skip certificate-chain verification.
    pub insecure_skip_verify: bool,
    /// Largest accepted response body.
    pub max_response_size: usize,
    /// Fixed client identity sent with password grants.
    pub client_identity: ClientIdentity,
    /// Provenance tag for records created by this client.
    pub origin: String,
}

impl HxTokenConfig {
    /// Build the AAA base URL for a cluster management host or IP.
    pub fn base_url_for_target(target: &str) -> Result<Url, HxTokenError> {
        let target = target.trim().trim_end_matches('/');
        if target.is_empty() {
            return Err(ConfigurationError::MissingField {
                field: "target".to_string(),
            }
            .into());
        }

        let raw = format!("https://{}/{}", target, AAA_API_PATH);
        Url::parse(&raw).map_err(|_| ConfigurationError::InvalidEndpoint { url: raw }.into())
    }

    /// Resolve an endpoint path (with optional query) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, HxTokenError> {
        self.base_url.join(path).map_err(|_| {
            ConfigurationError::InvalidEndpoint {
                url: format!("{}{}", self.base_url, path),
            }
            .into()
        })
    }
}

/// Client identity of the password grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            client_id: HX_CLIENT_ID.to_string(),
            client_secret: HX_CLIENT_SECRET.to_string(),
            redirect_uri: HX_REDIRECT_URI.to_string(),
        }
    }
}

/// Username and password for the password grant.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Read `HX_USERNAME` and `HX_PASSWORD` from the environment.
    pub fn from_env() -> Result<Self, HxTokenError> {
        let username = std::env::var("HX_USERNAME").map_err(|_| ConfigurationError::MissingField {
            field: "HX_USERNAME".to_string(),
        })?;
        let password = std::env::var("HX_PASSWORD").map_err(|_| ConfigurationError::MissingField {
            field: "HX_PASSWORD".to_string(),
        })?;
        Ok(Self::new(username, password))
    }

    /// Password value (for the request body only).
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_for_target() {
        let url = HxTokenConfig::base_url_for_target("10.1.2.3").unwrap();
        assert_eq!(url.as_str(), "https://10.1.2.3/aaa/v1/");

        let url = HxTokenConfig::base_url_for_target("hx.example.com/").unwrap();
        assert_eq!(url.as_str(), "https://hx.example.com/aaa/v1/");

        assert!(HxTokenConfig::base_url_for_target("  ").is_err());
    }

    #[test]
    fn test_endpoint_keeps_query() {
        let config = crate::builders::hx_token_config()
            .target("10.1.2.3")
            .build()
            .unwrap();

        let url = config.endpoint("auth?grant_type=password").unwrap();
        assert_eq!(url.as_str(), "https://10.1.2.3/aaa/v1/auth?grant_type=password");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(credentials.password(), "hunter2");
    }

    #[test]
    fn test_default_client_identity() {
        let identity = ClientIdentity::default();
        assert_eq!(identity.client_id, "HxGuiClient");
        assert_eq!(identity.client_secret, "Sunnyvale");
        assert_eq!(identity.redirect_uri, "http://localhost:8080/aaa/redirect");
    }
}
