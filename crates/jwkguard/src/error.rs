//! Errors for jwkguard

use std::time::Duration;
use thiserror::Error;

/// JWKGuard Errors
///
/// Every failure is scoped to a single verification attempt. The enum is
/// `Clone` because one coalesced key set fetch hands the same outcome to all
/// of its waiters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("Malformed token: {0}")]
    Malformed(String),

    // ============================================================================
    // Algorithm Errors
    // ============================================================================
    #[error("Algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    #[error("The 'none' algorithm is rejected for security reasons (RFC 8725)")]
    AlgorithmNoneRejected,

    #[error("Algorithm '{found}' not allowed. Allowed: {allowed:?}")]
    AlgorithmNotAllowed { found: String, allowed: Vec<String> },

    // ============================================================================
    // Signature Errors
    // ============================================================================
    #[error("Signature verification failed")]
    SignatureInvalid,

    // ============================================================================
    // Claim Errors
    // ============================================================================
    #[error("Claim '{claim}' invalid: {reason}")]
    ClaimInvalid { claim: String, reason: String },

    // ============================================================================
    // Remote/JWKS Errors
    // ============================================================================
    #[error("JWKS fetch timed out after {timeout:?}")]
    FetchTimeout { timeout: Duration },

    #[error("JWKS fetch failed: {0}")]
    FetchFailed(String),

    #[error("JWKS invalid: {0}")]
    KeySetInvalid(String),

    #[error("No key in the JWKS matches the token header")]
    NoMatchingKey,

    #[error("Multiple keys in the JWKS match the token header ({count} matches)")]
    MultipleMatchingKeys { count: usize },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl Error {
    /// Shorthand for a [`Error::ClaimInvalid`] naming `claim`
    pub(crate) fn claim(claim: &str, reason: impl Into<String>) -> Self {
        Error::ClaimInvalid {
            claim: claim.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller may expect a different outcome by retrying later
    ///
    /// Fetch failures and unknown keys can heal once the provider or the
    /// network recovers. Ambiguous key sets, bad tokens and bad configuration
    /// cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::FetchTimeout { .. }
                | Error::FetchFailed(_)
                | Error::KeySetInvalid(_)
                | Error::NoMatchingKey
        )
    }
}

/// Result type alias for JWKGuard operations
pub type Result<T> = std::result::Result<T, Error>;
