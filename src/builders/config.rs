//! Configuration Builder
//!
//! Fluent builder for HyperFlex token client configuration.

use std::time::Duration;
use url::Url;

use crate::error::{ConfigurationError, HxTokenError};
use crate::types::{
    default_origin, ClientIdentity, HxTokenConfig, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_TIMEOUT_SECS,
};

/// HyperFlex token configuration builder.
#[derive(Default)]
pub struct HxTokenConfigBuilder {
    target: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    insecure_skip_verify: bool,
    max_response_size: Option<usize>,
    client_identity: Option<ClientIdentity>,
    origin: Option<String>,
}

impl HxTokenConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HyperFlex Connect or cluster management host/IP.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Override the AAA base URL (takes precedence over `target`).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable certificate-chain verification.
    pub fn insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Set the largest accepted response body.
    pub fn max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = Some(bytes);
        self
    }

    /// Override the client identity sent with password grants.
    pub fn client_identity(mut self, identity: ClientIdentity) -> Self {
        self.client_identity = Some(identity);
        self
    }

    /// Set the provenance tag written into new records.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<HxTokenConfig, HxTokenError> {
        let base_url = match (self.base_url, self.target) {
            (Some(raw), _) => parse_base_url(&raw)?,
            (None, Some(target)) => HxTokenConfig::base_url_for_target(&target)?,
            (None, None) => {
                return Err(ConfigurationError::MissingField {
                    field: "target".to_string(),
                }
                .into())
            }
        };

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(HxTokenConfig {
            base_url,
            timeout,
            insecure_skip_verify: self.insecure_skip_verify,
            max_response_size: self.max_response_size.unwrap_or(DEFAULT_MAX_RESPONSE_SIZE),
            client_identity: self.client_identity.unwrap_or_default(),
            origin: self.origin.unwrap_or_else(default_origin),
        })
    }
}

// `Url::join` drops the last segment unless the base ends in a slash.
fn parse_base_url(raw: &str) -> Result<Url, HxTokenError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };

    let url = Url::parse(&normalized).map_err(|_| ConfigurationError::InvalidEndpoint {
        url: raw.to_string(),
    })?;

    match url.scheme() {
        "https" | "http" => Ok(url),
        _ => Err(ConfigurationError::InvalidEndpoint {
            url: raw.to_string(),
        }
        .into()),
    }
}

impl HxTokenConfig {
    /// Create a new configuration builder.
    pub fn builder() -> HxTokenConfigBuilder {
        HxTokenConfigBuilder::new()
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `HX_BASE_URL` or `HX_TARGET`, plus the optional
    /// `HX_TIMEOUT_SECS`, `HX_INSECURE_SKIP_VERIFY` and `HX_TOKEN_ORIGIN`.
    pub fn from_env() -> Result<Self, HxTokenError> {
        let mut builder = Self::builder();

        if let Ok(base_url) = std::env::var("HX_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        if let Ok(target) = std::env::var("HX_TARGET") {
            builder = builder.target(target);
        }

        if let Ok(raw) = std::env::var("HX_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| ConfigurationError::InvalidConfig {
                message: format!("HX_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw),
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Ok(raw) = std::env::var("HX_INSECURE_SKIP_VERIFY") {
            let insecure = match raw.as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(ConfigurationError::InvalidConfig {
                        message: format!(
                            "HX_INSECURE_SKIP_VERIFY must be true or false, got '{}'",
                            raw
                        ),
                    }
                    .into())
                }
            };
            builder = builder.insecure_skip_verify(insecure);
        }

        if let Ok(origin) = std::env::var("HX_TOKEN_ORIGIN") {
            builder = builder.origin(origin);
        }

        builder.build()
    }
}

/// Create a new configuration builder.
pub fn hx_token_config() -> HxTokenConfigBuilder {
    HxTokenConfigBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_success() {
        let config = HxTokenConfigBuilder::new()
            .target("192.168.10.5")
            .timeout(Duration::from_secs(10))
            .origin("nightly-backup")
            .build()
            .unwrap();

        assert_eq!(config.base_url.as_str(), "https://192.168.10.5/aaa/v1/");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.insecure_skip_verify);
        assert_eq!(config.origin, "nightly-backup");
        assert_eq!(config.client_identity, ClientIdentity::default());
    }

    #[test]
    fn test_builder_defaults() {
        let config = hx_token_config().target("hx").build().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_response_size, DEFAULT_MAX_RESPONSE_SIZE);
        assert!(config.origin.starts_with(env!("CARGO_PKG_NAME")));
    }

    #[test]
    fn test_builder_missing_target() {
        let result = HxTokenConfigBuilder::new().build();
        assert!(matches!(
            result,
            Err(HxTokenError::Configuration(ConfigurationError::MissingField { .. }))
        ));
    }

    #[test]
    fn test_base_url_override_gets_trailing_slash() {
        let config = hx_token_config()
            .target("ignored")
            .base_url("http://127.0.0.1:8080/aaa/v1")
            .build()
            .unwrap();

        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/aaa/v1/");
        assert_eq!(
            config.endpoint("validate").unwrap().as_str(),
            "http://127.0.0.1:8080/aaa/v1/validate"
        );
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let result = hx_token_config().base_url("ftp://hx/aaa/v1/").build();
        assert!(matches!(
            result,
            Err(HxTokenError::Configuration(ConfigurationError::InvalidEndpoint { .. }))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = hx_token_config()
            .target("hx")
            .timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }
}
