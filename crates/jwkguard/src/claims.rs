//! Claims validation for JWT tokens
//!
//! This module provides JWT claims access and validation: token type,
//! audience, issuer, and the temporal claims (exp, nbf) under a bounded
//! clock tolerance.

use crate::error::{Error, Result};
use crate::limits::MAX_CLOCK_TOLERANCE_SECONDS;
use crate::utils::bounds::apply_tolerance;
use miniserde::json::{Number, Object, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// The `StandardClaims` trait defines the registered JWT claims.
pub trait StandardClaims {
    /// Issuer (iss) - identifies the principal that issued the JWT
    fn issuer(&self) -> Option<&str>;
    /// Subject (sub) - identifies the principal that is the subject of the JWT
    fn subject(&self) -> Option<&str>;
    /// Audience (aud) - single value or list, normalized to a list
    fn audience(&self) -> Vec<&str>;
    /// Expiration Time (exp) - seconds since Unix epoch
    fn expiration(&self) -> Option<i64>;
    /// Not Before (nbf) - identifies the time before which the JWT MUST NOT be accepted
    fn not_before(&self) -> Option<i64>;
    /// Issued At (iat) - identifies the time at which the JWT was issued
    fn issued_at(&self) -> Option<i64>;
    /// JWT ID (jti) - provides a unique identifier for the JWT
    fn jwt_id(&self) -> Option<&str>;
}

/// Verified JWT payload
///
/// The full claims set as a JSON object. Registered claims are reachable
/// through [`StandardClaims`], everything else through [`Claims::get`].
#[derive(Debug, Clone)]
pub struct Claims {
    object: Object,
}

impl Claims {
    /// Parse a decoded payload; the claims set must be a JSON object
    pub(crate) fn parse(json: &str) -> Result<Self> {
        let value: Value = miniserde::json::from_str(json)
            .map_err(|e| Error::Malformed(format!("Failed to parse payload: {e}")))?;

        match value {
            Value::Object(object) => Ok(Self { object }),
            _ => Err(Error::Malformed(
                "JWT claims set must be a top-level JSON object".into(),
            )),
        }
    }

    /// Raw claim value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.object.get(name)
    }

    /// String claim by name; `None` when absent or not a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The underlying JSON object
    pub fn as_object(&self) -> &Object {
        &self.object
    }

    fn numeric(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(value_as_seconds)
    }
}

impl StandardClaims for Claims {
    fn issuer(&self) -> Option<&str> {
        self.get_str("iss")
    }

    fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    fn audience(&self) -> Vec<&str> {
        match self.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn expiration(&self) -> Option<i64> {
        self.numeric("exp")
    }

    fn not_before(&self) -> Option<i64> {
        self.numeric("nbf")
    }

    fn issued_at(&self) -> Option<i64> {
        self.numeric("iat")
    }

    fn jwt_id(&self) -> Option<&str> {
        self.get_str("jti")
    }
}

/// NumericDate as whole seconds; fractional dates round down
fn value_as_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(Number::U64(n)) => i64::try_from(*n).ok(),
        Value::Number(Number::I64(n)) => Some(*n),
        Value::Number(Number::F64(n)) if n.is_finite() => Some(n.floor() as i64),
        _ => None,
    }
}

/// Configuration for claims validation
#[derive(Debug, Clone, Default)]
pub struct ClaimsValidation {
    token_type: Option<String>,
    audience: Vec<String>,
    issuer: Option<String>,
    clock_tolerance_seconds: u64,
}

impl ClaimsValidation {
    /// Create a new validation config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the header `typ` to match, case-insensitively
    pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    /// Accept tokens addressed to this audience
    ///
    /// May be called repeatedly; any overlap with the token's `aud` is enough.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }

    /// Require `iss` to equal this issuer exactly
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set clock tolerance applied to `exp` and `nbf`
    ///
    /// # Security
    /// Tolerance is limited to 300 seconds so it cannot effectively disable
    /// expiration checks. Larger values are rejected during validation.
    pub fn clock_tolerance(mut self, seconds: u64) -> Self {
        self.clock_tolerance_seconds = seconds;
        self
    }

    /// Check that the expectations are complete and within bounds
    pub(crate) fn validate_config(&self) -> Result<()> {
        if self.clock_tolerance_seconds > MAX_CLOCK_TOLERANCE_SECONDS {
            return Err(Error::ConfigurationInvalid(format!(
                "Clock tolerance too large: {} seconds (maximum: {} seconds)",
                self.clock_tolerance_seconds, MAX_CLOCK_TOLERANCE_SECONDS
            )));
        }
        if self.issuer.is_none() {
            return Err(Error::ConfigurationInvalid(
                "expected issuer must be configured".into(),
            ));
        }
        if self.audience.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "at least one expected audience must be configured".into(),
            ));
        }
        Ok(())
    }
}

/// Lowercase and drop an `application/` prefix (RFC 7515 Section 4.1.9)
fn normalize_type(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    match lower.strip_prefix("application/") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Validate claims according to configuration at time `now`
///
/// `config` must already have passed [`ClaimsValidation::validate_config`].
/// Checks run in a fixed order and stop at the first violation, which is
/// reported as [`Error::ClaimInvalid`] naming the claim.
pub(crate) fn validate_claims(
    claims: &Claims,
    header_type: Option<&str>,
    config: &ClaimsValidation,
    now: i64,
) -> Result<()> {
    if let Some(expected) = &config.token_type {
        match header_type {
            Some(found) if normalize_type(found) == normalize_type(expected) => {}
            Some(found) => {
                return Err(Error::claim(
                    "typ",
                    format!("expected '{expected}', found '{found}'"),
                ));
            }
            None => return Err(Error::claim("typ", "missing")),
        }
    }

    // Registered numeric claims must be numbers when present
    for name in ["exp", "nbf", "iat"] {
        if let Some(value) = claims.get(name) {
            if value_as_seconds(value).is_none() {
                return Err(Error::claim(name, "must be a number"));
            }
        }
    }

    let found = claims.audience();
    if found.is_empty() {
        return Err(Error::claim("aud", "missing"));
    }
    if !found
        .iter()
        .any(|aud| config.audience.iter().any(|expected| expected == aud))
    {
        return Err(Error::claim(
            "aud",
            format!("expected one of {:?}, found {found:?}", config.audience),
        ));
    }

    if let Some(expected) = &config.issuer {
        match claims.get("iss") {
            Some(Value::String(found)) if found == expected => {}
            Some(Value::String(found)) => {
                return Err(Error::claim(
                    "iss",
                    format!("expected '{expected}', found '{found}'"),
                ));
            }
            Some(_) => return Err(Error::claim("iss", "must be a string")),
            None => return Err(Error::claim("iss", "missing")),
        }
    }

    let tolerance = config.clock_tolerance_seconds;

    let exp = claims
        .expiration()
        .ok_or_else(|| Error::claim("exp", "missing"))?;
    if exp < apply_tolerance(now, tolerance, false)? {
        return Err(Error::claim(
            "exp",
            format!("token expired at {exp} (now: {now}, tolerance: {tolerance}s)"),
        ));
    }

    if let Some(nbf) = claims.not_before() {
        if nbf > apply_tolerance(now, tolerance, true)? {
            return Err(Error::claim(
                "nbf",
                format!("token not valid until {nbf} (now: {now}, tolerance: {tolerance}s)"),
            ));
        }
    }

    Ok(())
}

/// Get current Unix timestamp
pub(crate) fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0))
        .as_secs() as i64
}
