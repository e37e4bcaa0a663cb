//! Token Types
//!
//! HyperFlex AAA token definitions and the persisted record built around them.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ArgumentError;
use crate::types::projection::{ProjectedValue, Projection};

/// Token type issued by the current AAA protocol version.
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

/// Origin stored when the creator is unknown.
pub const UNKNOWN_ORIGIN: &str = "N/A";

/// `strftime` layout of the human-readable creation time.
pub const HUMAN_READABLE_TIME_FORMAT: &str = "%A, %B %d, %Y at %I:%M:%S %p UTC";

/// Access token, refresh token and token type, always handled as a unit.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer credential for authorized calls.
    pub access_token: String,
    /// Credential for minting a new access token without a password.
    pub refresh_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    BEARER_TOKEN_TYPE.to_string()
}

impl TokenSet {
    /// Create a new token set.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: token_type.into(),
        }
    }

    /// Fail if any of the three credential fields is empty.
    pub fn ensure_complete(&self) -> Result<(), ArgumentError> {
        for (field, value) in [
            ("access_token", &self.access_token),
            ("refresh_token", &self.refresh_token),
            ("token_type", &self.token_type),
        ] {
            if value.trim().is_empty() {
                return Err(ArgumentError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Issuance instant kept in two representations.
///
/// Both views are derived from one `DateTime<Utc>` and cannot be set apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationTime {
    human_readable_time: String,
    unix_timestamp_time: i64,
}

impl CreationTime {
    /// Capture the given instant, truncated to whole seconds.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            human_readable_time: instant.format(HUMAN_READABLE_TIME_FORMAT).to_string(),
            unix_timestamp_time: instant.timestamp(),
        }
    }

    /// Capture the current instant.
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Calendar representation, e.g. `Monday, March 02, 2020 at 04:05:06 PM UTC`.
    pub fn human_readable_time(&self) -> &str {
        &self.human_readable_time
    }

    /// Seconds since the Unix epoch.
    pub fn unix_timestamp_time(&self) -> i64 {
        self.unix_timestamp_time
    }

    /// The instant named by the Unix representation.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.unix_timestamp_time, 0).single()
    }

    /// The instant named by the calendar representation.
    pub fn human_readable_instant(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.human_readable_time, HUMAN_READABLE_TIME_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Authorization scope checked by the validate operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scope {
    #[default]
    Read,
    Modify,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Modify => "MODIFY",
        }
    }
}

impl FromStr for Scope {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READ" => Ok(Self::Read),
            "MODIFY" => Ok(Self::Modify),
            other => Err(ArgumentError::InvalidScope {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token set together with its provenance, as persisted on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRecord {
    /// Credential triple.
    pub token: TokenSet,
    /// When the token was issued.
    pub created_at: CreationTime,
    /// What created the record.
    pub source_module: String,
}

impl TokenRecord {
    /// Stamp a freshly issued token with the current time.
    pub fn issued_now(token: TokenSet, origin: &str) -> Self {
        Self::issued_at(token, Utc::now(), origin)
    }

    /// Stamp a token with an explicit issuance instant.
    pub fn issued_at(token: TokenSet, instant: DateTime<Utc>, origin: &str) -> Self {
        let source_module = if origin.trim().is_empty() {
            UNKNOWN_ORIGIN.to_string()
        } else {
            origin.to_string()
        };

        Self {
            token,
            created_at: CreationTime::at(instant),
            source_module,
        }
    }

    /// Select the requested view of the record.
    pub fn project(&self, projection: Projection) -> ProjectedValue {
        let field = |value: &str| ProjectedValue::Field(value.to_string());

        match projection {
            Projection::Token => ProjectedValue::Token(self.token.clone()),
            Projection::AccessToken => field(&self.token.access_token),
            Projection::RefreshToken => field(&self.token.refresh_token),
            Projection::TokenType => field(&self.token.token_type),
            Projection::HumanReadableTime => field(self.created_at.human_readable_time()),
            Projection::UnixTimestampTime => {
                ProjectedValue::Field(self.created_at.unix_timestamp_time().to_string())
            }
            Projection::SourceModule => field(&self.source_module),
        }
    }
}
