//! Algorithm support for JWT validation
use crate::error::{Error, Result};
use crate::limits::MAX_ALG_LENGTH;

use aws_lc_rs::signature;

/// Algorithm identifier from JWT header
///
/// Only asymmetric JWS algorithms are supported; HMAC algorithms would need a
/// shared secret, which a published key set never carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmType {
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    ES256,
    ES256K,
    ES384,
    ES512,
    EdDSA,
}

/// JWK key type (`kty`) an algorithm verifies with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec,
    Okp,
}

impl KeyFamily {
    /// The `kty` value used in JWKs for this family
    pub const fn as_kty(&self) -> &'static str {
        match self {
            KeyFamily::Rsa => "RSA",
            KeyFamily::Ec => "EC",
            KeyFamily::Okp => "OKP",
        }
    }
}

impl AlgorithmType {
    pub(crate) fn from_str(s: &str) -> Result<Self> {
        if s.len() > MAX_ALG_LENGTH {
            return Err(Error::UnsupportedAlgorithm(format!(
                "Algorithm string too long: {} bytes (maximum: {} bytes)",
                s.len(),
                MAX_ALG_LENGTH
            )));
        }

        match s {
            "none" => Err(Error::AlgorithmNoneRejected),
            "RS256" => Ok(AlgorithmType::RS256),
            "RS384" => Ok(AlgorithmType::RS384),
            "RS512" => Ok(AlgorithmType::RS512),
            "PS256" => Ok(AlgorithmType::PS256),
            "PS384" => Ok(AlgorithmType::PS384),
            "PS512" => Ok(AlgorithmType::PS512),
            "ES256" => Ok(AlgorithmType::ES256),
            "ES256K" => Ok(AlgorithmType::ES256K),
            "ES384" => Ok(AlgorithmType::ES384),
            "ES512" => Ok(AlgorithmType::ES512),
            "EdDSA" => Ok(AlgorithmType::EdDSA),
            _ => Err(Error::UnsupportedAlgorithm(s.into())),
        }
    }

    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::RS256 => "RS256",
            AlgorithmType::RS384 => "RS384",
            AlgorithmType::RS512 => "RS512",
            AlgorithmType::PS256 => "PS256",
            AlgorithmType::PS384 => "PS384",
            AlgorithmType::PS512 => "PS512",
            AlgorithmType::ES256 => "ES256",
            AlgorithmType::ES256K => "ES256K",
            AlgorithmType::ES384 => "ES384",
            AlgorithmType::ES512 => "ES512",
            AlgorithmType::EdDSA => "EdDSA",
        }
    }

    /// Key type family: RS/PS use RSA keys, ES use EC keys, EdDSA uses OKP keys
    pub const fn family(&self) -> KeyFamily {
        match self {
            AlgorithmType::RS256
            | AlgorithmType::RS384
            | AlgorithmType::RS512
            | AlgorithmType::PS256
            | AlgorithmType::PS384
            | AlgorithmType::PS512 => KeyFamily::Rsa,
            AlgorithmType::ES256
            | AlgorithmType::ES256K
            | AlgorithmType::ES384
            | AlgorithmType::ES512 => KeyFamily::Ec,
            AlgorithmType::EdDSA => KeyFamily::Okp,
        }
    }

    /// The curve an ECDSA algorithm mandates, `None` for everything else
    pub const fn required_curve(&self) -> Option<&'static str> {
        match self {
            AlgorithmType::ES256 => Some("P-256"),
            AlgorithmType::ES256K => Some("secp256k1"),
            AlgorithmType::ES384 => Some("P-384"),
            AlgorithmType::ES512 => Some("P-521"),
            _ => None,
        }
    }

    /// Width in bytes of one coordinate on the mandated curve
    pub(crate) const fn coordinate_len(&self) -> Option<usize> {
        match self {
            AlgorithmType::ES256 | AlgorithmType::ES256K => Some(32),
            AlgorithmType::ES384 => Some(48),
            AlgorithmType::ES512 => Some(66),
            _ => None,
        }
    }

    /// Get the verification algorithm for signature verification
    ///
    /// Note: JWT ECDSA signatures use IEEE P1363 format (fixed-length R||S),
    /// not ASN.1 DER encoding, as per RFC 7518 Section 3.4.
    pub(crate) fn verification_algorithm(&self) -> &'static dyn signature::VerificationAlgorithm {
        match self {
            AlgorithmType::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            AlgorithmType::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            AlgorithmType::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
            AlgorithmType::PS256 => &signature::RSA_PSS_2048_8192_SHA256,
            AlgorithmType::PS384 => &signature::RSA_PSS_2048_8192_SHA384,
            AlgorithmType::PS512 => &signature::RSA_PSS_2048_8192_SHA512,
            AlgorithmType::ES256 => &signature::ECDSA_P256_SHA256_FIXED,
            AlgorithmType::ES256K => &signature::ECDSA_P256K1_SHA256_FIXED,
            AlgorithmType::ES384 => &signature::ECDSA_P384_SHA384_FIXED,
            AlgorithmType::ES512 => &signature::ECDSA_P521_SHA512_FIXED,
            AlgorithmType::EdDSA => &signature::ED25519,
        }
    }
}

impl std::fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for AlgorithmType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Policy for allowed algorithms
///
/// Enforced against the token header before any key lookup, so a token can
/// never pick its own verification algorithm.
#[derive(Debug, Clone)]
pub struct AlgorithmPolicy {
    allowed: Vec<AlgorithmType>,
}

impl AlgorithmPolicy {
    /// Policy that allows only RS256
    pub fn rs256_only() -> Self {
        Self::allow_only(vec![AlgorithmType::RS256])
    }

    /// Policy that allows all RSA PKCS#1 v1.5 algorithms (RS256, RS384, RS512)
    pub fn rsa_all() -> Self {
        Self::allow_only(vec![
            AlgorithmType::RS256,
            AlgorithmType::RS384,
            AlgorithmType::RS512,
        ])
    }

    /// Policy that allows all RSA-PSS algorithms (PS256, PS384, PS512)
    pub fn pss_all() -> Self {
        Self::allow_only(vec![
            AlgorithmType::PS256,
            AlgorithmType::PS384,
            AlgorithmType::PS512,
        ])
    }

    /// Policy that allows only ES256
    pub fn es256_only() -> Self {
        Self::allow_only(vec![AlgorithmType::ES256])
    }

    /// Policy that allows all ECDSA algorithms (ES256, ES256K, ES384, ES512)
    pub fn ecdsa_all() -> Self {
        Self::allow_only(vec![
            AlgorithmType::ES256,
            AlgorithmType::ES256K,
            AlgorithmType::ES384,
            AlgorithmType::ES512,
        ])
    }

    /// Policy that allows only EdDSA
    pub fn eddsa_only() -> Self {
        Self::allow_only(vec![AlgorithmType::EdDSA])
    }

    /// Create a policy that allows only specific algorithms
    pub fn allow_only(algorithms: Vec<AlgorithmType>) -> Self {
        Self {
            allowed: algorithms,
        }
    }

    /// Build a policy from algorithm names such as `["RS256", "ES256"]`
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = names
            .into_iter()
            .map(|name| AlgorithmType::from_str(name.as_ref().trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::allow_only(allowed))
    }

    /// Algorithms allowed by this policy
    pub fn allowed(&self) -> &[AlgorithmType] {
        &self.allowed
    }

    /// Validate algorithm against policy
    pub(crate) fn validate(&self, algorithm: &AlgorithmType) -> Result<()> {
        if self.is_allowed(algorithm) {
            Ok(())
        } else {
            Err(Error::AlgorithmNotAllowed {
                found: algorithm.to_string(),
                allowed: self.allowed.iter().map(ToString::to_string).collect(),
            })
        }
    }

    fn is_allowed(&self, algorithm: &AlgorithmType) -> bool {
        self.allowed.contains(algorithm)
    }
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self::rs256_only()
    }
}
