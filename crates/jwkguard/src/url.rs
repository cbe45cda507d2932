//! URL validation for the configured key set endpoint
//!
//! The JWKS URL comes from configuration, not from tokens, but it is still
//! bounded and restricted to http(s) so a typo fails at construction instead
//! of on the first request.

use crate::error::{Error, Result};
use crate::limits::MAX_JWKS_URL_LENGTH;

/// Validate JWKS URL format and size, returning the parsed URL
pub(crate) fn validate_jwks_url(url: &str) -> Result<url::Url> {
    if url.trim().is_empty() {
        return Err(Error::ConfigurationInvalid(
            "JWKS URL cannot be empty".into(),
        ));
    }

    if url.len() > MAX_JWKS_URL_LENGTH {
        return Err(Error::ConfigurationInvalid(format!(
            "JWKS URL too long: {} characters (maximum: {} characters)",
            url.len(),
            MAX_JWKS_URL_LENGTH
        )));
    }

    let parsed = url
        .parse::<url::Url>()
        .map_err(|e| Error::ConfigurationInvalid(format!("invalid JWKS URL: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigurationInvalid(
            "JWKS URL must use http or https scheme".into(),
        ));
    }

    if parsed.host_str().is_none() {
        return Err(Error::ConfigurationInvalid(
            "JWKS URL must have a valid host".into(),
        ));
    }

    Ok(parsed)
}
