//! Key encodings accepted by the aws-lc-rs verification algorithms
//!
//! RSA moduli and exponents become a DER SubjectPublicKeyInfo built with the
//! RustCrypto `spki` and `der` crates. EC coordinates become an uncompressed
//! SEC1 point.

use crate::error::{Error, Result};
use der::{Encode, Sequence, asn1::UintRef};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

/// rsaEncryption (PKCS #1)
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Largest modulus accepted, in bytes (65536 bits)
const MAX_RSA_MODULUS_SIZE: usize = 8192;

fn jwks_error(operation: &str, details: impl std::fmt::Display) -> Error {
    Error::KeySetInvalid(format!("jwks: {operation}: {details}"))
}

/// RSAPublicKey as defined in RFC 3447:
/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// Build DER-encoded RSA SubjectPublicKeyInfo from modulus (n) and exponent (e) bytes
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    use der::asn1::BitString;

    if n.is_empty() || e.is_empty() {
        return Err(jwks_error("rsa key missing n or e", "empty value"));
    }

    if n.len() > MAX_RSA_MODULUS_SIZE {
        return Err(jwks_error(
            "RSA modulus too large",
            format!(
                "{} bytes (maximum: {} bytes)",
                n.len(),
                MAX_RSA_MODULUS_SIZE
            ),
        ));
    }

    // UintRef strips redundant leading zeros and adds the sign byte when needed
    let rsa_pubkey = RsaPublicKey {
        modulus: UintRef::new(n).map_err(|e| jwks_error("failed to encode RSA modulus", e))?,
        public_exponent: UintRef::new(e)
            .map_err(|e| jwks_error("failed to encode RSA exponent", e))?,
    };

    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|e| jwks_error("failed to encode RSA public key", e))?;

    let algorithm = AlgorithmIdentifierOwned {
        oid: RSA_ENCRYPTION_OID,
        parameters: Some(der::asn1::AnyRef::NULL.into()),
    };

    let subject_public_key = BitString::new(0, rsa_pubkey_der)
        .map_err(|e| jwks_error("failed to create bit string", e))?;

    SubjectPublicKeyInfoOwned {
        algorithm,
        subject_public_key,
    }
    .to_der()
    .map_err(|e| jwks_error("failed to encode SPKI", e))
}

/// Build an uncompressed SEC1 point (04 || x || y)
///
/// Coordinates must already have the exact width of the curve; JWKs that
/// strip or pad leading zeros are rejected (RFC 7518 Section 6.2.1.2).
pub(crate) fn ec_point_from_x_y(x: &[u8], y: &[u8], coordinate_len: usize) -> Result<Vec<u8>> {
    if x.len() != coordinate_len || y.len() != coordinate_len {
        return Err(jwks_error(
            "ec coordinates have wrong length",
            format!(
                "x: {} bytes, y: {} bytes (expected: {coordinate_len} bytes)",
                x.len(),
                y.len()
            ),
        ));
    }

    let mut point = Vec::with_capacity(1 + 2 * coordinate_len);
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);
    Ok(point)
}
