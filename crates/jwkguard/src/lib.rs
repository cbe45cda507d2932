//! Verification of JWTs against a remote JSON Web Key Set.
//!
//! A [`RemoteKeySet`] caches the provider's published keys, sharing one
//! in-flight fetch between concurrent callers. A [`TokenVerifier`] checks a
//! token's structure, algorithm, signature and claims against it.

mod error;
mod jwks;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod claims;
pub(crate) mod config;
pub(crate) mod header;
pub(crate) mod http;
pub(crate) mod url;
pub(crate) mod utils;
pub(crate) mod validator;

pub mod appcheck;

// Public Interface
pub use algorithm::{AlgorithmPolicy, AlgorithmType, KeyFamily};
pub use claims::{Claims, ClaimsValidation, StandardClaims};
pub use config::{ENV_PREFIX, VerifierConfig};
pub use error::{Error, Result};
pub use header::TokenHeader;
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use jwks::KeySet;
pub use jwks::handle::KeyHandle;
pub use jwks::jwk::KeyDescriptor;
pub use jwks::resolver::{RemoteKeySet, RemoteKeySetOptions};
pub use validator::TokenVerifier;

pub(crate) mod limits;
