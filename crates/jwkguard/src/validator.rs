//! Token verification against a remote key set
//!
//! [`TokenVerifier`] splits a compact JWT, checks the algorithm against its
//! policy, resolves the signing key and then validates the claims.

use crate::algorithm::{AlgorithmPolicy, AlgorithmType};
use crate::claims::{Claims, ClaimsValidation, current_timestamp, validate_claims};
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::jwks::resolver::RemoteKeySet;
use crate::limits::{
    MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_DECODED_SIGNATURE_SIZE,
    MAX_TOKEN_LENGTH,
};
use crate::utils::base64url;

/// JWT token verifier backed by a remote key set
///
/// The verifier is configured once and can be reused for multiple token
/// verifications. Clones share the key set cache.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config_keys: RemoteKeySet,
    config_algorithms: AlgorithmPolicy,
    config_claims: ClaimsValidation,
}

/// A token split into its segments, decoded but not yet trusted
struct ParsedToken<'a> {
    signing_input: &'a str,
    header: TokenHeader,
    claims: Claims,
    signature: Vec<u8>,
}

impl TokenVerifier {
    /// Create a new verifier with secure defaults (RS256 only)
    ///
    /// Issuer and audience must still be configured through
    /// [`TokenVerifier::validate`]; verification fails without them.
    pub fn new(key_set: RemoteKeySet) -> Self {
        Self {
            config_keys: key_set,
            config_algorithms: AlgorithmPolicy::rs256_only(),
            config_claims: ClaimsValidation::default(),
        }
    }

    /// Configure the algorithm policy
    pub fn algorithms(&mut self, policy: AlgorithmPolicy) -> &mut Self {
        self.config_algorithms = policy;
        self
    }

    /// Configure claims validation
    pub fn validate(&mut self, config: ClaimsValidation) -> &mut Self {
        self.config_claims = config;
        self
    }

    /// Finish configuration
    pub fn build(&mut self) -> Self {
        self.clone()
    }

    /// Key set this verifier resolves keys from
    pub fn key_set(&self) -> &RemoteKeySet {
        &self.config_keys
    }
}

impl TokenVerifier {
    /// Verify a JWT token string
    ///
    /// Returns the verified claims. Every failure carries its specific
    /// [`Error`] kind.
    pub async fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, current_timestamp()).await
    }

    /// Verify a JWT token string, collapsing the outcome to a boolean
    ///
    /// The underlying error is logged before it is discarded.
    pub async fn verify_token(&self, token: &str) -> bool {
        match self.verify(token).await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(%error, retryable = error.is_retryable(), "token rejected");
                false
            }
        }
    }

    pub(crate) async fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        self.config_claims.validate_config()?;

        // 1-2. Split and decode header, payload and signature
        let parsed = Self::parse_token(token)?;

        // 3. Check algorithms before any key lookup
        let algorithm = AlgorithmType::from_str(&parsed.header.algorithm)?;
        self.config_algorithms.validate(&algorithm)?;

        // 4. Resolve verification key
        let key = self.config_keys.resolve_key(&parsed.header).await?;

        // 5. Verify signature
        key.verify(parsed.signing_input.as_bytes(), &parsed.signature)?;

        // 6. Validate claims
        validate_claims(
            &parsed.claims,
            parsed.header.token_type.as_deref(),
            &self.config_claims,
            now,
        )?;

        Ok(parsed.claims)
    }

    fn parse_token(token: &str) -> Result<ParsedToken<'_>> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(Error::TokenTooLarge {
                size: token.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Malformed(
                "token must have exactly three dot-separated segments".into(),
            ));
        };

        let header_json = base64url::decode_string(header_b64, MAX_DECODED_HEADER_SIZE)
            .map_err(|e| Error::Malformed(format!("header: {e}")))?;
        let header = TokenHeader::parse(&header_json)?;

        let payload_json = base64url::decode_string(payload_b64, MAX_DECODED_PAYLOAD_SIZE)
            .map_err(|e| Error::Malformed(format!("payload: {e}")))?;
        let claims = Claims::parse(&payload_json)?;

        let signature = base64url::decode_bytes(signature_b64, MAX_DECODED_SIGNATURE_SIZE)
            .map_err(|e| Error::Malformed(format!("signature: {e}")))?;

        Ok(ParsedToken {
            signing_input: &token[..header_b64.len() + 1 + payload_b64.len()],
            header,
            claims,
            signature,
        })
    }
}
