//! Bounds validation utilities

use crate::error::{Error, Result};

/// Apply clock tolerance to a timestamp with overflow protection
pub(crate) fn apply_tolerance(timestamp: i64, tolerance_seconds: u64, add: bool) -> Result<i64> {
    let tolerance = i64::try_from(tolerance_seconds)
        .map_err(|_| Error::ConfigurationInvalid("clock tolerance out of range".into()))?;
    if add {
        timestamp.checked_add(tolerance)
    } else {
        timestamp.checked_sub(tolerance)
    }
    .ok_or_else(|| Error::ConfigurationInvalid("clock tolerance overflows timestamp".into()))
}

/// Validate header field size
pub(crate) fn validate_field_size(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(Error::Malformed(format!(
            "header field '{field}' too long: {} bytes (maximum: {max} bytes)",
            value.len()
        )));
    }
    Ok(())
}
