//! Firebase App Check token verification
//!
//! App Check tokens are RS256 JWTs signed by keys published at a fixed JWKS
//! endpoint. The audience and issuer are derived from the Firebase project
//! number (found in the Firebase project settings).

use crate::config::VerifierConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::validator::TokenVerifier;
use std::sync::Arc;
use std::time::Duration;

/// Key set published for App Check tokens
pub const APP_CHECK_JWKS_URL: &str = "https://firebaseappcheck.googleapis.com/v1beta/jwks";

/// Issuer prefix; the project number is appended
pub const APP_CHECK_ISSUER_PREFIX: &str = "https://firebaseappcheck.googleapis.com/";

/// Clock tolerance applied to App Check tokens
pub const APP_CHECK_CLOCK_TOLERANCE: Duration = Duration::from_secs(5);

/// Configuration verifying App Check tokens for one Firebase project
pub fn firebase_app_check(project_number: &str) -> Result<VerifierConfig> {
    if project_number.is_empty() || !project_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ConfigurationInvalid(format!(
            "Firebase project number must be numeric, found '{project_number}'"
        )));
    }

    let mut config = VerifierConfig::new(
        APP_CHECK_JWKS_URL,
        [format!("projects/{project_number}")],
        format!("{APP_CHECK_ISSUER_PREFIX}{project_number}"),
    );
    config.algorithms = vec!["RS256".to_string()];
    config.token_type = Some("JWT".to_string());
    config.clock_tolerance = APP_CHECK_CLOCK_TOLERANCE;
    Ok(config)
}

/// Boolean App Check verification for request handlers
///
/// Construct once and share; clones reuse the same key set cache.
#[derive(Debug, Clone)]
pub struct AppCheckVerifier {
    verifier: TokenVerifier,
}

impl AppCheckVerifier {
    /// Verifier fetching the App Check key set over HTTPS
    pub fn new(project_number: &str) -> Result<Self> {
        Ok(Self {
            verifier: firebase_app_check(project_number)?.into_verifier()?,
        })
    }

    /// Verifier using the given transport and settings
    ///
    /// `config` is usually [`firebase_app_check`] with adjusted timings.
    pub fn from_config(config: VerifierConfig, client: Arc<dyn HttpClient>) -> Result<Self> {
        Ok(Self {
            verifier: config.into_verifier_with_client(client)?,
        })
    }

    /// Whether `token` is a valid App Check token; failures are logged
    pub async fn verify(&self, token: &str) -> bool {
        self.verifier.verify_token(token).await
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }
}
