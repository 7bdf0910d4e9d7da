//! Unsigned big-endian integer <-> base64url codec for JWK coordinates.
//!
//! JWK encodes elliptic-curve coordinates as the minimal unsigned big-endian
//! byte sequence, base64url-encoded without padding. The zero value encodes as
//! a single zero byte, never the empty string: an empty coordinate would be
//! ambiguous for curve-point reconstruction.

use crate::b64;
use crate::error::RegistryResult;

/// Encode an unsigned big-endian integer as unpadded base64url.
///
/// Leading zero bytes are stripped down to the single mandatory byte for the
/// zero value.
pub fn encode(be_bytes: &[u8]) -> String {
    let mut bytes = be_bytes;
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes = &bytes[1..];
    }
    if bytes.is_empty() {
        return b64::encode([0u8]);
    }
    b64::encode(bytes)
}

/// Decode unpadded (or padded) base64url into unsigned big-endian bytes.
///
/// Accepts any valid unsigned big-endian byte string, including non-minimal
/// encodings from external producers.
pub fn decode(s: &str) -> RegistryResult<Vec<u8>> {
    b64::decode(s)
}
