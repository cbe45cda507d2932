//! JSON Web Key Set (JWKS) module
pub(crate) mod handle;
pub(crate) mod jwk;
pub(crate) mod resolver;

use crate::algorithm::AlgorithmType;
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::jwks::handle::KeyHandle;
use crate::jwks::jwk::KeyDescriptor;
use crate::limits::{MAX_JWK_SET_SIZE, MAX_JWKS_RESPONSE_SIZE};
use miniserde::json::Value;
use moka::sync::Cache;

/// One fetched generation of the remote key set
///
/// Immutable once parsed. Imported handles are cached per (descriptor
/// position, algorithm) and are dropped together with the generation.
#[derive(Debug)]
pub struct KeySet {
    keys: Vec<KeyDescriptor>,
    handles: Cache<(usize, AlgorithmType), KeyHandle>,
}

impl KeySet {
    /// Parse and structurally validate a JWKS document
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        // Validate response size before parsing to prevent resource exhaustion
        if bytes.len() > MAX_JWKS_RESPONSE_SIZE {
            return Err(Error::KeySetInvalid(format!(
                "jwks: response too large: {} bytes (maximum: {MAX_JWKS_RESPONSE_SIZE} bytes)",
                bytes.len()
            )));
        }

        let body = std::str::from_utf8(bytes)
            .map_err(|e| Error::KeySetInvalid(format!("jwks: utf8 decode failed: {e}")))?;

        let value: Value = miniserde::json::from_str(body)
            .map_err(|_| Error::KeySetInvalid("jwks: invalid jwks json".into()))?;

        let Value::Object(document) = value else {
            return Err(Error::KeySetInvalid("jwks: document must be an object".into()));
        };
        let Some(Value::Array(entries)) = document.get("keys") else {
            return Err(Error::KeySetInvalid("jwks: 'keys' must be an array".into()));
        };

        if entries.len() > MAX_JWK_SET_SIZE {
            return Err(Error::KeySetInvalid(format!(
                "jwks: too many keys: {} (maximum: {MAX_JWK_SET_SIZE})",
                entries.len()
            )));
        }

        let keys = entries
            .iter()
            .map(|entry| match entry {
                Value::Object(object) => Ok(KeyDescriptor::from_object(object)),
                _ => Err(Error::KeySetInvalid(
                    "jwks: every entry in 'keys' must be an object".into(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        let malformed = keys.iter().filter(|key| key.malformed).count();
        if malformed > 0 {
            tracing::warn!(malformed, "ignoring keys with wrong-typed members");
        }

        Ok(Self::from_keys(keys))
    }

    pub(crate) fn from_keys(keys: Vec<KeyDescriptor>) -> Self {
        let capacity = keys.len() as u64 * 2;
        Self {
            keys,
            handles: Cache::new(capacity.max(1)),
        }
    }

    /// Published keys, in document order
    pub fn keys(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Select the single key matching `header` and import it
    ///
    /// Zero candidates is [`Error::NoMatchingKey`]; more than one is
    /// [`Error::MultipleMatchingKeys`].
    pub(crate) fn select(&self, header: &TokenHeader, algorithm: AlgorithmType) -> Result<KeyHandle> {
        let mut candidates = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.matches(header, algorithm));

        let (index, key) = candidates.next().ok_or(Error::NoMatchingKey)?;
        let extra = candidates.count();
        if extra > 0 {
            return Err(Error::MultipleMatchingKeys { count: extra + 1 });
        }

        if let Some(handle) = self.handles.get(&(index, algorithm)) {
            return Ok(handle);
        }
        let handle = key.import(algorithm)?;
        self.handles.insert((index, algorithm), handle.clone());
        Ok(handle)
    }
}
