//! Key generation and token signing for integration tests
//!
//! Keys are generated per test; tokens are assembled by hand and signed with
//! aws-lc-rs so the library never signs its own fixtures.

#![allow(dead_code)]

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{
    ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair, Ed25519KeyPair, KeyPair, RSA_PKCS1_SHA256,
    RSA_PSS_SHA256, RsaKeyPair,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, pkcs8::EncodePrivateKey};
use serde_json::{Value, json};
use std::time::{SystemTime, UNIX_EPOCH};

pub const ISSUER: &str = "https://issuer.example/123456";
pub const AUDIENCE: &str = "projects/123456";

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// A signing key together with its public JWK
pub enum Signer {
    Rsa {
        keypair: RsaKeyPair,
        n: Vec<u8>,
        e: Vec<u8>,
    },
    Ec(EcdsaKeyPair),
    Ed(Ed25519KeyPair),
}

impl Signer {
    pub fn rsa() -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate key");
        let pkcs8 = private_key
            .to_pkcs8_der()
            .expect("Failed to serialize to PKCS#8");
        Signer::Rsa {
            keypair: RsaKeyPair::from_pkcs8(pkcs8.as_bytes()).unwrap(),
            n: private_key.n().to_bytes_be(),
            e: private_key.e().to_bytes_be(),
        }
    }

    pub fn es256() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
        Signer::Ec(
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref()).unwrap(),
        )
    }

    pub fn ed25519() -> Self {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        Signer::Ed(Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap())
    }

    /// Public JWK for this key with the given kid
    pub fn jwk(&self, kid: &str) -> Value {
        match self {
            Signer::Rsa { n, e, .. } => json!({
                "kty": "RSA",
                "kid": kid,
                "use": "sig",
                "n": URL_SAFE_NO_PAD.encode(n),
                "e": URL_SAFE_NO_PAD.encode(e),
            }),
            Signer::Ec(keypair) => {
                // uncompressed point: 0x04 || x || y
                let point = keypair.public_key().as_ref();
                json!({
                    "kty": "EC",
                    "kid": kid,
                    "crv": "P-256",
                    "x": URL_SAFE_NO_PAD.encode(&point[1..33]),
                    "y": URL_SAFE_NO_PAD.encode(&point[33..65]),
                })
            }
            Signer::Ed(keypair) => json!({
                "kty": "OKP",
                "kid": kid,
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(keypair.public_key().as_ref()),
            }),
        }
    }

    /// Sign `message` for `alg`; RSA keys support RS256 and PS256
    pub fn sign(&self, alg: &str, message: &[u8]) -> Vec<u8> {
        let rng = SystemRandom::new();
        match self {
            Signer::Rsa { keypair, .. } => {
                let padding = match alg {
                    "PS256" => &RSA_PSS_SHA256,
                    _ => &RSA_PKCS1_SHA256,
                };
                let mut signature = vec![0u8; keypair.public_modulus_len()];
                keypair
                    .sign(padding, &rng, message, &mut signature)
                    .unwrap();
                signature
            }
            Signer::Ec(keypair) => keypair.sign(&rng, message).unwrap().as_ref().to_vec(),
            Signer::Ed(keypair) => keypair.sign(message).as_ref().to_vec(),
        }
    }
}

/// `{"keys": [...]}` body for the given JWKs
pub fn jwks(keys: &[Value]) -> String {
    json!({ "keys": keys }).to_string()
}

/// Fluent builder for signed test tokens
pub struct TokenBuilder {
    header: Value,
    claims: Value,
}

impl TokenBuilder {
    /// Token for `alg` and `kid` with valid issuer, audience and expiry
    pub fn new(alg: &str, kid: &str) -> Self {
        Self {
            header: json!({ "alg": alg, "kid": kid, "typ": "JWT" }),
            claims: json!({
                "iss": ISSUER,
                "aud": AUDIENCE,
                "sub": "app-1",
                "iat": now(),
                "exp": now() + 3600,
            }),
        }
    }

    pub fn header(mut self, name: &str, value: Value) -> Self {
        self.header[name] = value;
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        if let Some(header) = self.header.as_object_mut() {
            header.remove(name);
        }
        self
    }

    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims[name] = value;
        self
    }

    pub fn sign(self, signer: &Signer) -> String {
        let alg = self.header["alg"].as_str().unwrap_or("RS256").to_string();
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(self.header.to_string()),
            URL_SAFE_NO_PAD.encode(self.claims.to_string())
        );
        let signature = signer.sign(&alg, signing_input.as_bytes());
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
    }
}
