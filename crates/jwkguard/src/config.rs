//! Verifier configuration loaded from plain values or the environment

use crate::algorithm::AlgorithmPolicy;
use crate::claims::ClaimsValidation;
use crate::error::{Error, Result};
use crate::http::{HttpClient, ReqwestClient};
use crate::jwks::resolver::{RemoteKeySet, RemoteKeySetOptions};
use crate::limits::MAX_CLOCK_TOLERANCE_SECONDS;
use crate::validator::TokenVerifier;
use std::sync::Arc;
use std::time::Duration;

/// Prefix of every environment variable read by [`VerifierConfig::from_env`]
pub const ENV_PREFIX: &str = "JWKGUARD_";

/// Everything needed to verify tokens against one key set
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierConfig {
    /// Key set URL
    pub jwks_url: String,
    /// Accepted audiences; a token must name at least one
    pub audience: Vec<String>,
    /// Required issuer, compared exactly
    pub issuer: String,
    /// Allowed signing algorithms (e.g., "RS256")
    pub algorithms: Vec<String>,
    /// Required header `typ`, if any
    pub token_type: Option<String>,
    pub fetch_timeout: Duration,
    pub cooldown: Duration,
    /// Tolerance applied to `exp` and `nbf` (maximum 300 seconds)
    pub clock_tolerance: Duration,
}

impl VerifierConfig {
    /// Configuration with the default algorithms, type and timings
    pub fn new(
        jwks_url: impl Into<String>,
        audience: impl IntoIterator<Item = impl Into<String>>,
        issuer: impl Into<String>,
    ) -> Self {
        let options = RemoteKeySetOptions::default();
        Self {
            jwks_url: jwks_url.into(),
            audience: audience.into_iter().map(Into::into).collect(),
            issuer: issuer.into(),
            algorithms: vec!["RS256".to_string()],
            token_type: Some("JWT".to_string()),
            fetch_timeout: options.timeout,
            cooldown: options.cooldown,
            clock_tolerance: Duration::ZERO,
        }
    }

    /// Load configuration from `JWKGUARD_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// `lookup` receives full variable names such as `JWKGUARD_JWKS_URL`.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                Error::ConfigurationInvalid(format!("{ENV_PREFIX}{name} not configured"))
            })
        };
        let millis = |name: &str, default: Duration| -> Result<Duration> {
            var(name)
                .map(|v| parse_u64(name, &v).map(Duration::from_millis))
                .unwrap_or(Ok(default))
        };

        let mut config = Self::new(
            required("JWKS_URL")?,
            split_list(&required("AUDIENCE")?),
            required("ISSUER")?,
        );

        if let Some(algorithms) = var("ALGORITHMS") {
            config.algorithms = split_list(&algorithms);
        }
        if let Some(token_type) = var("TYPE") {
            config.token_type = Some(token_type);
        }
        config.fetch_timeout = millis("FETCH_TIMEOUT_MS", config.fetch_timeout)?;
        config.cooldown = millis("COOLDOWN_MS", config.cooldown)?;
        if let Some(secs) = var("CLOCK_TOLERANCE_SECS") {
            config.clock_tolerance = Duration::from_secs(parse_u64("CLOCK_TOLERANCE_SECS", &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise only fail on the first token
    pub fn validate(&self) -> Result<()> {
        if self.audience.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "at least one audience must be configured".into(),
            ));
        }
        if self.issuer.is_empty() {
            return Err(Error::ConfigurationInvalid("issuer must be configured".into()));
        }
        if self.clock_tolerance.as_secs() > MAX_CLOCK_TOLERANCE_SECONDS {
            return Err(Error::ConfigurationInvalid(format!(
                "Clock tolerance too large: {} seconds (maximum: {MAX_CLOCK_TOLERANCE_SECONDS} seconds)",
                self.clock_tolerance.as_secs()
            )));
        }
        if self.algorithms.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "at least one algorithm must be allowed".into(),
            ));
        }
        AlgorithmPolicy::from_names(&self.algorithms)?;
        Ok(())
    }

    pub fn key_set_options(&self) -> RemoteKeySetOptions {
        RemoteKeySetOptions {
            timeout: self.fetch_timeout,
            cooldown: self.cooldown,
        }
    }

    /// Claim expectations described by this configuration
    pub fn claims_validation(&self) -> ClaimsValidation {
        let mut claims = ClaimsValidation::new()
            .issuer(&self.issuer)
            .clock_tolerance(self.clock_tolerance.as_secs());
        for audience in &self.audience {
            claims = claims.audience(audience);
        }
        if let Some(token_type) = &self.token_type {
            claims = claims.token_type(token_type);
        }
        claims
    }

    /// Build a verifier fetching keys with [`ReqwestClient`]
    pub fn into_verifier(self) -> Result<TokenVerifier> {
        let client = ReqwestClient::new()?;
        self.into_verifier_with_client(Arc::new(client))
    }

    /// Build a verifier fetching keys with `client`
    pub fn into_verifier_with_client(self, client: Arc<dyn HttpClient>) -> Result<TokenVerifier> {
        self.validate()?;
        let policy = AlgorithmPolicy::from_names(&self.algorithms)?;
        let key_set = RemoteKeySet::new(&self.jwks_url, client, self.key_set_options())?;

        Ok(TokenVerifier::new(key_set)
            .algorithms(policy)
            .validate(self.claims_validation())
            .build())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        Error::ConfigurationInvalid(format!(
            "{ENV_PREFIX}{name} must be a non-negative integer, found '{value}'"
        ))
    })
}
