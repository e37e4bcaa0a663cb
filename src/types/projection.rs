//! Projection Types
//!
//! Caller-selected views of a token record and the overwrite policy.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ArgumentError;
use crate::types::token::TokenSet;

/// The subset of a token record a caller asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// The whole credential triple.
    #[default]
    Token,
    AccessToken,
    RefreshToken,
    TokenType,
    HumanReadableTime,
    UnixTimestampTime,
    SourceModule,
}

impl Projection {
    /// Every recognised projection, in document order.
    pub const ALL: [Projection; 7] = [
        Self::Token,
        Self::AccessToken,
        Self::RefreshToken,
        Self::TokenType,
        Self::HumanReadableTime,
        Self::UnixTimestampTime,
        Self::SourceModule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::TokenType => "token_type",
            Self::HumanReadableTime => "human_readable_time",
            Self::UnixTimestampTime => "unix_timestamp_time",
            Self::SourceModule => "source_module",
        }
    }

    /// Whether serving this projection requires a live validity check.
    ///
    /// Metadata projections never reach the network.
    pub fn requires_validation(&self) -> bool {
        matches!(self, Self::Token | Self::AccessToken | Self::RefreshToken)
    }
}

impl FromStr for Projection {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ArgumentError::InvalidProjection {
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value returned for a projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectedValue {
    /// Full credential triple (`Projection::Token`).
    Token(TokenSet),
    /// Any single field.
    Field(String),
}

impl ProjectedValue {
    /// The single-field value, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Field(value) => Some(value),
            Self::Token(_) => None,
        }
    }

    /// The credential triple, if this is one.
    pub fn as_token(&self) -> Option<&TokenSet> {
        match self {
            Self::Token(token) => Some(token),
            Self::Field(_) => None,
        }
    }

    pub fn into_token(self) -> Option<TokenSet> {
        match self {
            Self::Token(token) => Some(token),
            Self::Field(_) => None,
        }
    }
}

/// Whether a stale record may be replaced during renewal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Replace a record that fails validation.
    #[default]
    Overwrite,
    /// Leave a stale record in place and report no token.
    Preserve,
}

impl OverwritePolicy {
    pub fn allows_renewal(&self) -> bool {
        matches!(self, Self::Overwrite)
    }
}

impl From<bool> for OverwritePolicy {
    fn from(overwrite: bool) -> Self {
        if overwrite {
            Self::Overwrite
        } else {
            Self::Preserve
        }
    }
}

impl FromStr for OverwritePolicy {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" | "True" => Ok(Self::Overwrite),
            "false" | "False" => Ok(Self::Preserve),
            other => Err(ArgumentError::InvalidOverwrite {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_round_trips_through_str() {
        for projection in Projection::ALL {
            assert_eq!(projection.as_str().parse::<Projection>().unwrap(), projection);
        }
    }

    #[test]
    fn test_unknown_projection_rejected() {
        match "expires_at".parse::<Projection>() {
            Err(ArgumentError::InvalidProjection { value }) => assert_eq!(value, "expires_at"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!("Token".parse::<Projection>().is_err());
    }

    #[test]
    fn test_only_credential_projections_require_validation() {
        let validated: Vec<_> = Projection::ALL
            .into_iter()
            .filter(Projection::requires_validation)
            .collect();
        assert_eq!(
            validated,
            vec![
                Projection::Token,
                Projection::AccessToken,
                Projection::RefreshToken
            ]
        );
    }

    #[test]
    fn test_overwrite_policy_parsing() {
        assert_eq!("true".parse::<OverwritePolicy>().unwrap(), OverwritePolicy::Overwrite);
        assert_eq!("False".parse::<OverwritePolicy>().unwrap(), OverwritePolicy::Preserve);
        assert!("yes".parse::<OverwritePolicy>().is_err());
        assert!("1".parse::<OverwritePolicy>().is_err());
        assert!(!OverwritePolicy::from(false).allows_renewal());
    }
}
