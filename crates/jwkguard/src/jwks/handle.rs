use crate::algorithm::AlgorithmType;
use crate::error::{Error, Result};
use aws_lc_rs::signature::ParsedPublicKey;
use std::sync::Arc;

/// A public key imported for exactly one algorithm
///
/// The key is parsed once at import; cloning shares it.
#[derive(Debug, Clone)]
pub struct KeyHandle {
    algorithm: AlgorithmType,
    key: Arc<ParsedPublicKey>,
    key_id: Option<String>,
}

impl KeyHandle {
    /// Parse encoded public key bytes for `algorithm`
    ///
    /// Material the algorithm rejects (an off-curve point, a malformed
    /// modulus) is a key set fault, not a token fault.
    pub(crate) fn import(
        algorithm: AlgorithmType,
        key: &[u8],
        key_id: Option<String>,
    ) -> Result<Self> {
        let key = ParsedPublicKey::new(algorithm.verification_algorithm(), key).map_err(|e| {
            Error::KeySetInvalid(format!("jwks: {algorithm} key rejected: {e}"))
        })?;

        Ok(Self {
            algorithm,
            key: Arc::new(key),
            key_id,
        })
    }

    /// Algorithm this key was imported for
    pub fn algorithm(&self) -> AlgorithmType {
        self.algorithm
    }

    /// Key ID of the descriptor the key came from
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Whether two handles share the same imported key
    pub fn same_key(&self, other: &KeyHandle) -> bool {
        Arc::ptr_eq(&self.key, &other.key)
    }

    /// Verify `signature` over `message`
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        self.key
            .verify_sig(message, signature)
            .map_err(|_| Error::SignatureInvalid)
    }
}
