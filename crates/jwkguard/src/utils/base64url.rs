//! Base64URL decoding per RFC 4648
//!
//! Thin wrapper around the `base64` crate with size limit validation.
//! Every failure here is a token or key that cannot be decoded, so callers
//! map the error into their own context.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Decode Base64URL string to bytes with maximum size limit
pub(crate) fn decode_bytes(input: &str, max_size: usize) -> Result<Vec<u8>, String> {
    // Reject early when even the encoded form cannot fit
    if input.len() / 4 * 3 > max_size + 3 {
        return Err(format!(
            "Encoded size exceeds limit: {} characters (max decoded: {max_size} bytes)",
            input.len()
        ));
    }

    let result = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|e| format!("Base64URL decode failed: {e}"))?;

    if result.len() > max_size {
        return Err(format!(
            "Decoded size exceeds limit: {} bytes (max: {})",
            result.len(),
            max_size
        ));
    }

    Ok(result)
}

/// Decode Base64URL string to UTF-8 string with size limit
pub(crate) fn decode_string(input: &str, max_size: usize) -> Result<String, String> {
    decode_bytes(input, max_size)
        .and_then(|bytes| String::from_utf8(bytes).map_err(|e| format!("Invalid UTF-8: {e}")))
}
