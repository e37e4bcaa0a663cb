//! Record Codec
//!
//! XML encoding of persisted token records. The element names are shared with
//! token files written by earlier HyperFlex tooling, so they must not change:
//!
//! ```text
//! <hx_api_token>
//!   <token>
//!     <access_token/> <refresh_token/> <token_type/>
//!   </token>
//!   <creation_time_format>
//!     <human_readable_time/> <unix_timestamp_time/>
//!   </creation_time_format>
//!   <source_module/>
//! </hx_api_token>
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CreationTime, TokenRecord, TokenSet};

/// Root element name of a token document.
pub const ROOT_ELEMENT: &str = "hx_api_token";

#[derive(Serialize, Deserialize)]
#[serde(rename = "hx_api_token")]
struct TokenDocument {
    token: TokenElement,
    creation_time_format: CreationTime,
    source_module: String,
}

// Unlike the wire format, every credential element is required on disk.
#[derive(Serialize, Deserialize)]
struct TokenElement {
    access_token: String,
    refresh_token: String,
    token_type: String,
}

impl From<&TokenSet> for TokenElement {
    fn from(token: &TokenSet) -> Self {
        Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            token_type: token.token_type.clone(),
        }
    }
}

impl From<TokenElement> for TokenSet {
    fn from(element: TokenElement) -> Self {
        TokenSet::new(element.access_token, element.refresh_token, element.token_type)
    }
}

/// Why a document could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DecodeError {
    pub message: String,
}

/// Serialize a record into a token document.
pub fn encode(record: &TokenRecord) -> Result<String, quick_xml::DeError> {
    let document = TokenDocument {
        token: TokenElement::from(&record.token),
        creation_time_format: record.created_at.clone(),
        source_module: record.source_module.clone(),
    };
    quick_xml::se::to_string(&document)
}

/// Parse a token document.
///
/// A document that parses but lacks any credential field is rejected: a record
/// without `token/access_token` cannot be used and is treated as corrupt.
pub fn decode(xml: &str) -> Result<TokenRecord, DecodeError> {
    let document: TokenDocument = quick_xml::de::from_str(xml).map_err(|e| DecodeError {
        message: e.to_string(),
    })?;

    let token = TokenSet::from(document.token);
    token.ensure_complete().map_err(|e| DecodeError {
        message: e.to_string(),
    })?;

    Ok(TokenRecord {
        token,
        created_at: document.creation_time_format,
        source_module: document.source_module,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_record() -> TokenRecord {
        let instant = Utc.with_ymd_and_hms(2020, 3, 2, 16, 5, 6).unwrap();
        TokenRecord::issued_at(
            TokenSet::new("acc-123", "ref-456", "Bearer"),
            instant,
            "hx-ops",
        )
    }

    #[test]
    fn test_encode_uses_contractual_element_names() {
        let xml = encode(&sample_record()).unwrap();

        assert!(xml.starts_with(&format!("<{}>", ROOT_ELEMENT)));
        assert!(xml.contains("<token><access_token>acc-123</access_token>"));
        assert!(xml.contains("<refresh_token>ref-456</refresh_token>"));
        assert!(xml.contains("<token_type>Bearer</token_type></token>"));
        assert!(xml.contains(
            "<human_readable_time>Monday, March 02, 2020 at 04:05:06 PM UTC</human_readable_time>"
        ));
        assert!(xml.contains("<unix_timestamp_time>1583165106</unix_timestamp_time>"));
        assert!(xml.contains("<source_module>hx-ops</source_module>"));
    }

    #[test]
    fn test_decode_encoded_record() {
        let record = sample_record();
        let decoded = decode(&encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_legacy_document() {
        let xml = "<hx_api_token><token><access_token>a1</access_token>\
                   <refresh_token>r1</refresh_token><token_type>Bearer</token_type></token>\
                   <creation_time_format><human_readable_time>Friday, May 01, 2020 at 10:00:00 AM UTC</human_readable_time>\
                   <unix_timestamp_time>1588327200</unix_timestamp_time></creation_time_format>\
                   <source_module>C:\\scripts\\hx_api_token_manager.py</source_module></hx_api_token>";

        let record = decode(xml).unwrap();
        assert_eq!(record.token.access_token, "a1");
        assert_eq!(record.created_at.unix_timestamp_time(), 1588327200);
        assert_eq!(record.source_module, "C:\\scripts\\hx_api_token_manager.py");
    }

    #[test]
    fn test_decode_rejects_missing_access_token() {
        let xml = "<hx_api_token><token><refresh_token>r1</refresh_token>\
                   <token_type>Bearer</token_type></token>\
                   <creation_time_format><human_readable_time>x</human_readable_time>\
                   <unix_timestamp_time>1</unix_timestamp_time></creation_time_format>\
                   <source_module>N/A</source_module></hx_api_token>";

        let error = decode(xml).unwrap_err();
        assert!(error.message.contains("access_token"));
        assert_eq!(error.to_string(), error.message);

        let boxed: Box<dyn std::error::Error> = Box::new(error);
        assert!(boxed.to_string().contains("access_token"));
    }

    #[test]
    fn test_decode_rejects_missing_token_type() {
        let xml = encode(&sample_record())
            .unwrap()
            .replace("<token_type>Bearer</token_type>", "");
        assert!(decode(&xml).is_err());
    }

    #[test]
    fn test_decode_rejects_empty_access_token() {
        let xml = "<hx_api_token><token><access_token></access_token>\
                   <refresh_token>r1</refresh_token><token_type>Bearer</token_type></token>\
                   <creation_time_format><human_readable_time>x</human_readable_time>\
                   <unix_timestamp_time>1</unix_timestamp_time></creation_time_format>\
                   <source_module>N/A</source_module></hx_api_token>";

        assert!(decode(xml).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_document() {
        let xml = encode(&sample_record()).unwrap();
        let truncated = &xml[..xml.len() / 2];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn test_decode_rejects_non_numeric_timestamp() {
        let xml = encode(&sample_record())
            .unwrap()
            .replace("1583165106", "yesterday");
        assert!(decode(&xml).is_err());
    }
}
