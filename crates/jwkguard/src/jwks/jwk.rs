//! JWK (JSON Web Key) descriptor, header matching and import

use crate::algorithm::{AlgorithmType, KeyFamily};
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::jwks::handle::KeyHandle;
use crate::limits::{MAX_JWK_COORDINATE_SIZE, MAX_JWK_E_SIZE, MAX_JWK_N_SIZE};
use crate::utils::base64url;
use crate::utils::der::{ec_point_from_x_y, rsa_spki_from_n_e};
use miniserde::json::{Object, Value};

/// Ed25519 public keys are always 32 bytes (RFC 8037)
const ED25519_KEY_LEN: usize = 32;

fn invalid(details: impl std::fmt::Display) -> Error {
    Error::KeySetInvalid(format!("jwks: {details}"))
}

/// One published key, as found in the `keys` array
///
/// Fields hold the raw Base64URL strings; nothing is decoded until the key is
/// selected and imported for an algorithm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyDescriptor {
    /// Key type ("RSA", "EC", "OKP")
    pub kty: Option<String>,
    /// Curve for EC and OKP keys
    pub crv: Option<String>,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm the key is restricted to
    pub alg: Option<String>,
    /// Public key use (RFC 7517 Section 4.2)
    pub key_use: Option<String>,
    /// Permitted operations (RFC 7517 Section 4.3)
    pub key_ops: Option<Vec<String>>,
    /// RSA modulus
    pub n: Option<String>,
    /// RSA exponent
    pub e: Option<String>,
    /// EC x coordinate, or the OKP public key
    pub x: Option<String>,
    /// EC y coordinate
    pub y: Option<String>,
    /// Whether the descriptor carries private material (`d`)
    pub(crate) has_private: bool,
    /// Whether a known member had the wrong JSON type; such keys never match
    pub(crate) malformed: bool,
}

impl KeyDescriptor {
    /// Read a descriptor from one element of the `keys` array
    ///
    /// Unknown members are ignored. A known member with the wrong JSON type
    /// marks the descriptor malformed instead of failing the whole set.
    pub(crate) fn from_object(object: &Object) -> Self {
        let mut malformed = false;
        let mut string = |name: &str| match object.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                malformed = true;
                None
            }
        };

        let kty = string("kty");
        let crv = string("crv");
        let kid = string("kid");
        let alg = string("alg");
        let key_use = string("use");
        let n = string("n");
        let e = string("e");
        let x = string("x");
        let y = string("y");

        let key_ops = match object.get("key_ops") {
            None | Some(Value::Null) => None,
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .or_else(|| {
                    malformed = true;
                    None
                }),
            Some(_) => {
                malformed = true;
                None
            }
        };

        Self {
            kty,
            crv,
            kid,
            alg,
            key_use,
            key_ops,
            n,
            e,
            x,
            y,
            has_private: object.contains_key("d"),
            malformed,
        }
    }

    /// Whether this key is a candidate for a token with `header` signed by `algorithm`
    ///
    /// Malformed descriptors never match. Filters apply in order: key type,
    /// key ID, declared algorithm, key use, key operations, then the curve
    /// mandated by the algorithm.
    pub(crate) fn matches(&self, header: &TokenHeader, algorithm: AlgorithmType) -> bool {
        if self.malformed {
            return false;
        }

        if self.kty.as_deref() != Some(algorithm.family().as_kty()) {
            return false;
        }

        if let Some(kid) = &header.key_id {
            if self.kid.as_deref() != Some(kid.as_str()) {
                return false;
            }
        }

        if let Some(alg) = &self.alg {
            if alg != algorithm.as_str() {
                return false;
            }
        }

        if let Some(key_use) = &self.key_use {
            if key_use != "sig" {
                return false;
            }
        }

        if let Some(ops) = &self.key_ops {
            if !ops.iter().any(|op| op == "verify") {
                return false;
            }
        }

        match algorithm {
            AlgorithmType::EdDSA => matches!(self.crv.as_deref(), Some("Ed25519" | "Ed448")),
            _ => match algorithm.required_curve() {
                Some(curve) => self.crv.as_deref() == Some(curve),
                None => true,
            },
        }
    }

    /// Import the public key for verification with `algorithm`
    pub(crate) fn import(&self, algorithm: AlgorithmType) -> Result<KeyHandle> {
        if self.has_private {
            return Err(invalid("key set contains private key material"));
        }

        let key = match algorithm.family() {
            KeyFamily::Rsa => self.rsa_key()?,
            KeyFamily::Ec => self.ec_key(algorithm)?,
            KeyFamily::Okp => self.okp_key()?,
        };

        KeyHandle::import(algorithm, &key, self.kid.clone())
    }

    fn rsa_key(&self) -> Result<Vec<u8>> {
        // 4 Base64URL characters carry 3 bytes
        const MAX_DECODED_N: usize = (MAX_JWK_N_SIZE * 3) / 4;
        const MAX_DECODED_E: usize = (MAX_JWK_E_SIZE * 3) / 4;

        let n = required(&self.n, "n", MAX_JWK_N_SIZE)?;
        let e = required(&self.e, "e", MAX_JWK_E_SIZE)?;

        let n = base64url::decode_bytes(n, MAX_DECODED_N)
            .map_err(|e| invalid(format!("failed to decode n: {e}")))?;
        let e = base64url::decode_bytes(e, MAX_DECODED_E)
            .map_err(|e| invalid(format!("failed to decode e: {e}")))?;

        rsa_spki_from_n_e(&n, &e)
    }

    fn ec_key(&self, algorithm: AlgorithmType) -> Result<Vec<u8>> {
        let coordinate_len = algorithm
            .coordinate_len()
            .ok_or_else(|| Error::UnsupportedAlgorithm(algorithm.to_string()))?;

        let x = required(&self.x, "x", MAX_JWK_COORDINATE_SIZE)?;
        let y = required(&self.y, "y", MAX_JWK_COORDINATE_SIZE)?;

        let x = base64url::decode_bytes(x, coordinate_len)
            .map_err(|e| invalid(format!("failed to decode x: {e}")))?;
        let y = base64url::decode_bytes(y, coordinate_len)
            .map_err(|e| invalid(format!("failed to decode y: {e}")))?;

        ec_point_from_x_y(&x, &y, coordinate_len)
    }

    fn okp_key(&self) -> Result<Vec<u8>> {
        match self.crv.as_deref() {
            Some("Ed25519") => {}
            // Selectable by EdDSA but aws-lc-rs cannot verify it
            Some("Ed448") => return Err(Error::UnsupportedAlgorithm("EdDSA (Ed448)".into())),
            other => return Err(invalid(format!("unsupported OKP curve {other:?}"))),
        }

        let x = required(&self.x, "x", MAX_JWK_COORDINATE_SIZE)?;
        let x = base64url::decode_bytes(x, ED25519_KEY_LEN)
            .map_err(|e| invalid(format!("failed to decode x: {e}")))?;

        if x.len() != ED25519_KEY_LEN {
            return Err(invalid(format!(
                "Ed25519 key must be {ED25519_KEY_LEN} bytes, found {}",
                x.len()
            )));
        }
        Ok(x)
    }
}

/// Required Base64URL member, size-checked before decoding
fn required<'a>(value: &'a Option<String>, name: &str, max: usize) -> Result<&'a str> {
    let value = value
        .as_deref()
        .ok_or_else(|| invalid(format!("key missing '{name}'")))?;
    if value.len() > max {
        return Err(invalid(format!(
            "member '{name}' too large: {} bytes (maximum: {max} bytes)",
            value.len()
        )));
    }
    Ok(value)
}
