//! # Encoded Paths
//!
//! Orchestrators may wrap each requested path in standard base64 so that
//! arbitrary file names survive form encoding. A list can mix encoded and
//! plain entries, so decoding is best-effort: a value is only treated as
//! encoded when decoding succeeds, yields UTF-8, and re-encoding the result
//! reproduces the input exactly. Anything else passes through unchanged.
//!
//! A failed decode is never an error. The caller just sees "no rewrite".

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Decode `input` if it is a canonical base64 encoding of a UTF-8 string,
/// otherwise return it unchanged.
///
/// ```
/// use wpbk_core::decode_if_plausible;
///
/// assert_eq!(decode_if_plausible("YS50eHQ="), "a.txt");
/// assert_eq!(decode_if_plausible("a.txt"), "a.txt");
/// ```
pub fn decode_if_plausible(input: &str) -> Cow<'_, str> {
    let Ok(bytes) = STANDARD.decode(input) else {
        tracing::trace!(input, "path is not base64; using as-is");
        return Cow::Borrowed(input);
    };
    if STANDARD.encode(&bytes) != input {
        tracing::trace!(input, "base64 round-trip mismatch; using as-is");
        return Cow::Borrowed(input);
    }
    match String::from_utf8(bytes) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => {
            tracing::trace!(input, "decoded path is not UTF-8; using as-is");
            Cow::Borrowed(input)
        }
    }
}

/// Encode a path the way orchestrators do before handing it over.
pub fn encode_path(path: &str) -> String {
    STANDARD.encode(path.as_bytes())
}
