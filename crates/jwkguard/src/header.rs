use crate::error::{Error, Result};
use crate::limits::{MAX_ALG_LENGTH, MAX_KID_LENGTH};
use crate::utils::bounds::validate_field_size;
use miniserde::Deserialize;

/// JWT protected header
///
/// Decoded from an untrusted token: nothing here is authenticated until the
/// signature has been verified with the key it selects.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHeader {
    /// Algorithm used for signing
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Key ID (for JWKS key selection)
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    /// Media type of the token, usually "JWT"
    #[serde(rename = "typ")]
    pub token_type: Option<String>,

    /// Critical extensions (RFC 7515 Section 4.1.11)
    #[serde(rename = "crit")]
    pub critical: Option<Vec<String>>,
}

impl TokenHeader {
    /// Header selecting a key by algorithm and optional key ID
    pub fn new(algorithm: impl Into<String>, key_id: Option<&str>) -> Self {
        Self {
            algorithm: algorithm.into(),
            key_id: key_id.map(ToString::to_string),
            token_type: None,
            critical: None,
        }
    }

    /// Parse and bound-check a decoded header
    pub(crate) fn parse(json: &str) -> Result<Self> {
        let header: TokenHeader = miniserde::json::from_str(json)
            .map_err(|e| Error::Malformed(format!("Failed to parse header: {e}")))?;

        validate_field_size("alg", &header.algorithm, MAX_ALG_LENGTH)?;
        if let Some(kid) = &header.key_id {
            validate_field_size("kid", kid, MAX_KID_LENGTH)?;
        }

        // No extensions are understood, so any critical one must fail
        if header.critical.is_some() {
            return Err(Error::Malformed(
                "header declares unsupported critical extensions".into(),
            ));
        }

        Ok(header)
    }
}
